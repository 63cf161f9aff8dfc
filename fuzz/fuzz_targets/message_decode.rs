#![no_main]

use libfuzzer_sys::fuzz_target;
use schema::{decode_message, FieldType, MessageSchema, SchemaSet};

fuzz_target!(|data: &[u8]| {
    let set = SchemaSet::new(vec![
        MessageSchema::new("Node")
            .field("value", 1, FieldType::Int32)
            .field("name", 2, FieldType::String)
            .field("children", 3, FieldType::repeated("Node"))
            .field("parent", 4, FieldType::message("Node")),
    ])
    .unwrap();
    let schema = set.get(&"Node".into()).unwrap();

    let outcome = decode_message(&set, schema, data);
    // Whatever decoded must re-encode.
    let _ = schema::to_vec(&outcome.message);
});
