//! The legacy login, world and zone opcode table.
//!
//! The table lives in `registry.json` next to this crate and is embedded at
//! compile time. Opcodes at `0x1000` and above are never sent on their own;
//! they name the layouts of nested records, arrays and list nodes.

use codec::{OpcodeRegistry, RegistryConfig, RegistryResult};

/// The embedded registry configuration.
pub const REGISTRY_JSON: &str = include_str!("../registry.json");

// Login, client to server.
pub const OP_LOGIN_WEB: u16 = 0x0001;
pub const OP_SERVER_LIST_REQUEST: u16 = 0x0002;
pub const OP_PLAY_EVERQUEST_REQUEST: u16 = 0x0003;
pub const OP_WEB_INITIATE_CONNECTION: u16 = 0x0004;
pub const OP_SEND_LOGIN_INFO: u16 = 0x0005;

// Login, server to client.
pub const OP_LOGIN_ACCEPTED: u16 = 0x0010;
pub const OP_SERVER_LIST_RESPONSE: u16 = 0x0011;
pub const OP_PLAY_EVERQUEST_RESPONSE: u16 = 0x0012;

// World.
pub const OP_SEND_CHAR_INFO: u16 = 0x0020;
pub const OP_ENTER_WORLD: u16 = 0x0021;
pub const OP_ZONE_SERVER_INFO: u16 = 0x0022;

// Zone.
pub const OP_CLEAR_OBJECT: u16 = 0x0030;
pub const OP_FINISH_TRADE: u16 = 0x0031;
pub const OP_LOOT_COMPLETE: u16 = 0x0032;
pub const OP_WORLD_OBJECTS_SENT: u16 = 0x0033;
pub const OP_TIME_OF_DAY: u16 = 0x0034;
pub const OP_MONEY_UPDATE: u16 = 0x0035;
pub const OP_GM_END_TRAINING_RESPONSE: u16 = 0x0036;
pub const OP_FINISH_WINDOW: u16 = 0x0037;
pub const OP_FINISH_WINDOW2: u16 = 0x0038;
pub const OP_ITEM_PACKET: u16 = 0x0039;
pub const OP_COLORED_TEXT: u16 = 0x003A;
pub const OP_FORMATTED_MESSAGE: u16 = 0x003B;
pub const OP_INTERRUPT_CAST: u16 = 0x003C;
pub const OP_ITEM_LINK_RESPONSE: u16 = 0x003D;
pub const OP_ZONE_SPAWNS: u16 = 0x003E;
pub const OP_COMPLETED_TASKS: u16 = 0x003F;
pub const OP_CHAR_INVENTORY: u16 = 0x0040;
pub const OP_CUSTOM_TITLES: u16 = 0x0041;
pub const OP_SPAWN_DOOR: u16 = 0x0042;
pub const OP_SEND_ZONEPOINTS: u16 = 0x0043;
pub const OP_TRIBUTE_INFO: u16 = 0x0044;
pub const OP_GUILD_TRIBUTE_INFO: u16 = 0x0045;
pub const OP_SEND_TITLE_LIST: u16 = 0x0046;
pub const OP_AA_EXP_UPDATE: u16 = 0x0047;
pub const OP_ACTION: u16 = 0x0048;
pub const OP_ADVENTURE_DATA: u16 = 0x0049;
pub const OP_ADVENTURE_FINISH: u16 = 0x004A;
pub const OP_ADVENTURE_POINTS_UPDATE: u16 = 0x004B;
pub const OP_ANIMATION: u16 = 0x004C;
pub const OP_BANKER_CHANGE: u16 = 0x004D;
pub const OP_BECOME_TRADER: u16 = 0x004E;
pub const OP_BEGIN_CAST: u16 = 0x004F;
pub const OP_CHARM: u16 = 0x0050;
pub const OP_CONSENT_RESPONSE: u16 = 0x0051;
pub const OP_EXP_UPDATE: u16 = 0x0052;
pub const OP_GROUND_SPAWN: u16 = 0x0053;
pub const OP_GROUP_UPDATE: u16 = 0x0054;
pub const OP_GUILD_MOTD: u16 = 0x0055;
pub const OP_GUILD_MANAGE_ADD: u16 = 0x0056;
pub const OP_GUILD_MANAGE_REMOVE: u16 = 0x0057;
pub const OP_GUILD_MANAGE_STATUS: u16 = 0x0058;
pub const OP_GUILD_MEMBER_UPDATE: u16 = 0x0059;
pub const OP_HP_UPDATE: u16 = 0x005A;
pub const OP_INCREASE_STATS: u16 = 0x005B;
pub const OP_LFG_APPEARANCE: u16 = 0x005C;
pub const OP_LEADERSHIP_EXP_UPDATE: u16 = 0x005D;
pub const OP_LEVEL_APPEARANCE: u16 = 0x005E;
pub const OP_LEVEL_UPDATE: u16 = 0x005F;
pub const OP_MOB_HEALTH: u16 = 0x0060;
pub const OP_MOB_RENAME: u16 = 0x0061;
pub const OP_MONEY_ON_CORPSE: u16 = 0x0062;
pub const OP_MOVE_DOOR: u16 = 0x0063;
pub const OP_NEW_SPAWN: u16 = 0x0064;
pub const OP_NEW_ZONE: u16 = 0x0065;
pub const OP_PETITION_CHECKOUT: u16 = 0x0066;
pub const OP_PETITION_UPDATE: u16 = 0x0067;
pub const OP_PLAYER_PROFILE: u16 = 0x0068;
pub const OP_RAID_UPDATE: u16 = 0x0069;
pub const OP_RANDOM_REPLY: u16 = 0x006A;
pub const OP_RECIPE_REPLY: u16 = 0x006B;
pub const OP_REQUEST_CLIENT_ZONE_CHANGE: u16 = 0x006C;
pub const OP_RESPOND_AA: u16 = 0x006D;
pub const OP_REZZ_REQUEST: u16 = 0x006E;
pub const OP_SET_TITLE_REPLY: u16 = 0x006F;
pub const OP_SHOP_DEL_ITEM: u16 = 0x0070;
pub const OP_SIMPLE_MESSAGE: u16 = 0x0071;
pub const OP_SKILL_UPDATE: u16 = 0x0072;
pub const OP_SOME_ITEM_PACKET_MAYBE: u16 = 0x0073;
pub const OP_STAMINA: u16 = 0x0074;
pub const OP_STUN: u16 = 0x0075;
pub const OP_TARGET_REJECT: u16 = 0x0076;
pub const OP_TRACK: u16 = 0x0077;
pub const OP_TRADE_COINS: u16 = 0x0078;
pub const OP_TRADE_MONEY_UPDATE: u16 = 0x0079;
pub const OP_TRADER_DEL_ITEM: u16 = 0x007A;
pub const OP_TRADER_ITEM_UPDATE: u16 = 0x007B;
pub const OP_UPDATE_LEADERSHIP_AA: u16 = 0x007C;
pub const OP_WEATHER: u16 = 0x007D;
pub const OP_ZONE_CHANGE: u16 = 0x007E;
pub const OP_ACCEPT_NEW_TASK: u16 = 0x007F;
pub const OP_ADVENTURE_INFO: u16 = 0x0080;
pub const OP_APPLY_POISON: u16 = 0x0081;
pub const OP_APPROVE_WORLD: u16 = 0x0082;
pub const OP_BANDOLIER: u16 = 0x0083;
pub const OP_BAZAAR_SEARCH: u16 = 0x0084;
pub const OP_BECOME_CORPSE: u16 = 0x0085;
pub const OP_CANCEL_TASK: u16 = 0x0086;
pub const OP_COMMAND: u16 = 0x0087;
pub const OP_DYNAMIC_WALL: u16 = 0x0088;
pub const OP_GUILDS_LIST: u16 = 0x0089;
pub const OP_LF_GUILD: u16 = 0x008A;
pub const OP_LOAD_SPELL_SET: u16 = 0x008B;
pub const OP_LOGIN: u16 = 0x008C;
pub const OP_LOG_SERVER: u16 = 0x008D;
pub const OP_MOTD: u16 = 0x008E;
pub const OP_ON_LEVEL_MESSAGE: u16 = 0x008F;
pub const OP_PLAY_MP3: u16 = 0x0090;
pub const OP_POTION_BELT: u16 = 0x0091;
pub const OP_PVP_STATS: u16 = 0x0092;
pub const OP_REPORT: u16 = 0x0093;
pub const OP_SPECIAL_MESG: u16 = 0x0094;
pub const OP_TASK_ACTIVITY: u16 = 0x0095;
pub const OP_TASK_DESCRIPTION: u16 = 0x0096;
pub const OP_ZONE_UNAVAIL: u16 = 0x0097;

// Nested records.
pub const NESTED_WORLD_SERVER: u16 = 0x1000;
pub const NESTED_CHARACTER_SELECT_ENTRY: u16 = 0x1001;
pub const NESTED_CHAR_SELECT_EQUIP: u16 = 0x1002;
pub const NESTED_TINT: u16 = 0x1003;
pub const NESTED_TEXTURE_PROFILE: u16 = 0x1004;
pub const NESTED_TINT_PROFILE: u16 = 0x1005;
pub const NESTED_TRIBUTE_LEVEL: u16 = 0x1006;
pub const NESTED_BIND_STRUCT: u16 = 0x1007;
pub const NESTED_AA_ARRAY: u16 = 0x1008;
pub const NESTED_SPELL_BUFF: u16 = 0x1009;
pub const NESTED_DISCIPLINES: u16 = 0x100A;
pub const NESTED_BANDOLIER: u16 = 0x100B;
pub const NESTED_POTION_BELT: u16 = 0x100C;
pub const NESTED_TRIBUTE: u16 = 0x100D;
pub const NESTED_LEADERSHIP_AA: u16 = 0x100E;
pub const NESTED_BAZAAR_WINDOW_START: u16 = 0x100F;

/// Parses the embedded configuration.
pub fn config() -> RegistryResult<RegistryConfig> {
    RegistryConfig::from_json(REGISTRY_JSON)
}

/// Builds the legacy opcode registry.
pub fn registry() -> RegistryResult<OpcodeRegistry> {
    config()?.build()
}

/// Returns the symbolic name of a legacy opcode.
#[must_use]
pub const fn opcode_name(opcode: u16) -> Option<&'static str> {
    let name = match opcode {
        OP_LOGIN_WEB => "OP_LoginWeb",
        OP_SERVER_LIST_REQUEST => "OP_ServerListRequest",
        OP_PLAY_EVERQUEST_REQUEST => "OP_PlayEverquestRequest",
        OP_WEB_INITIATE_CONNECTION => "OP_WebInitiateConnection",
        OP_SEND_LOGIN_INFO => "OP_SendLoginInfo",
        OP_LOGIN_ACCEPTED => "OP_LoginAccepted",
        OP_SERVER_LIST_RESPONSE => "OP_ServerListResponse",
        OP_PLAY_EVERQUEST_RESPONSE => "OP_PlayEverquestResponse",
        OP_SEND_CHAR_INFO => "OP_SendCharInfo",
        OP_ENTER_WORLD => "OP_EnterWorld",
        OP_ZONE_SERVER_INFO => "OP_ZoneServerInfo",
        OP_CLEAR_OBJECT => "OP_ClearObject",
        OP_FINISH_TRADE => "OP_FinishTrade",
        OP_LOOT_COMPLETE => "OP_LootComplete",
        OP_WORLD_OBJECTS_SENT => "OP_WorldObjectsSent",
        OP_TIME_OF_DAY => "OP_TimeOfDay",
        OP_MONEY_UPDATE => "OP_MoneyUpdate",
        OP_GM_END_TRAINING_RESPONSE => "OP_GMEndTrainingResponse",
        OP_FINISH_WINDOW => "OP_FinishWindow",
        OP_FINISH_WINDOW2 => "OP_FinishWindow2",
        OP_ITEM_PACKET => "OP_ItemPacket",
        OP_COLORED_TEXT => "OP_ColoredText",
        OP_FORMATTED_MESSAGE => "OP_FormattedMessage",
        OP_INTERRUPT_CAST => "OP_InterruptCast",
        OP_ITEM_LINK_RESPONSE => "OP_ItemLinkResponse",
        OP_ZONE_SPAWNS => "OP_ZoneSpawns",
        OP_COMPLETED_TASKS => "OP_CompletedTasks",
        OP_CHAR_INVENTORY => "OP_CharInventory",
        OP_CUSTOM_TITLES => "OP_CustomTitles",
        OP_SPAWN_DOOR => "OP_SpawnDoor",
        OP_SEND_ZONEPOINTS => "OP_SendZonepoints",
        OP_TRIBUTE_INFO => "OP_TributeInfo",
        OP_GUILD_TRIBUTE_INFO => "OP_GuildTributeInfo",
        OP_SEND_TITLE_LIST => "OP_SendTitleList",
        OP_AA_EXP_UPDATE => "OP_AAExpUpdate",
        OP_ACTION => "OP_Action",
        OP_ADVENTURE_DATA => "OP_AdventureData",
        OP_ADVENTURE_FINISH => "OP_AdventureFinish",
        OP_ADVENTURE_POINTS_UPDATE => "OP_AdventurePointsUpdate",
        OP_ANIMATION => "OP_Animation",
        OP_BANKER_CHANGE => "OP_BankerChange",
        OP_BECOME_TRADER => "OP_BecomeTrader",
        OP_BEGIN_CAST => "OP_BeginCast",
        OP_CHARM => "OP_Charm",
        OP_CONSENT_RESPONSE => "OP_ConsentResponse",
        OP_EXP_UPDATE => "OP_ExpUpdate",
        OP_GROUND_SPAWN => "OP_GroundSpawn",
        OP_GROUP_UPDATE => "OP_GroupUpdate",
        OP_GUILD_MOTD => "OP_GuildMOTD",
        OP_GUILD_MANAGE_ADD => "OP_GuildManageAdd",
        OP_GUILD_MANAGE_REMOVE => "OP_GuildManageRemove",
        OP_GUILD_MANAGE_STATUS => "OP_GuildManageStatus",
        OP_GUILD_MEMBER_UPDATE => "OP_GuildMemberUpdate",
        OP_HP_UPDATE => "OP_HPUpdate",
        OP_INCREASE_STATS => "OP_IncreaseStats",
        OP_LFG_APPEARANCE => "OP_LFGAppearance",
        OP_LEADERSHIP_EXP_UPDATE => "OP_LeadershipExpUpdate",
        OP_LEVEL_APPEARANCE => "OP_LevelAppearance",
        OP_LEVEL_UPDATE => "OP_LevelUpdate",
        OP_MOB_HEALTH => "OP_MobHealth",
        OP_MOB_RENAME => "OP_MobRename",
        OP_MONEY_ON_CORPSE => "OP_MoneyOnCorpse",
        OP_MOVE_DOOR => "OP_MoveDoor",
        OP_NEW_SPAWN => "OP_NewSpawn",
        OP_NEW_ZONE => "OP_NewZone",
        OP_PETITION_CHECKOUT => "OP_PetitionCheckout",
        OP_PETITION_UPDATE => "OP_PetitionUpdate",
        OP_PLAYER_PROFILE => "OP_PlayerProfile",
        OP_RAID_UPDATE => "OP_RaidUpdate",
        OP_RANDOM_REPLY => "OP_RandomReply",
        OP_RECIPE_REPLY => "OP_RecipeReply",
        OP_REQUEST_CLIENT_ZONE_CHANGE => "OP_RequestClientZoneChange",
        OP_RESPOND_AA => "OP_RespondAA",
        OP_REZZ_REQUEST => "OP_RezzRequest",
        OP_SET_TITLE_REPLY => "OP_SetTitleReply",
        OP_SHOP_DEL_ITEM => "OP_ShopDelItem",
        OP_SIMPLE_MESSAGE => "OP_SimpleMessage",
        OP_SKILL_UPDATE => "OP_SkillUpdate",
        OP_SOME_ITEM_PACKET_MAYBE => "OP_SomeItemPacketMaybe",
        OP_STAMINA => "OP_Stamina",
        OP_STUN => "OP_Stun",
        OP_TARGET_REJECT => "OP_TargetReject",
        OP_TRACK => "OP_Track",
        OP_TRADE_COINS => "OP_TradeCoins",
        OP_TRADE_MONEY_UPDATE => "OP_TradeMoneyUpdate",
        OP_TRADER_DEL_ITEM => "OP_TraderDelItem",
        OP_TRADER_ITEM_UPDATE => "OP_TraderItemUpdate",
        OP_UPDATE_LEADERSHIP_AA => "OP_UpdateLeadershipAA",
        OP_WEATHER => "OP_Weather",
        OP_ZONE_CHANGE => "OP_ZoneChange",
        OP_ACCEPT_NEW_TASK => "OP_AcceptNewTask",
        OP_ADVENTURE_INFO => "OP_AdventureInfo",
        OP_APPLY_POISON => "OP_ApplyPoison",
        OP_APPROVE_WORLD => "OP_ApproveWorld",
        OP_BANDOLIER => "OP_Bandolier",
        OP_BAZAAR_SEARCH => "OP_BazaarSearch",
        OP_BECOME_CORPSE => "OP_BecomeCorpse",
        OP_CANCEL_TASK => "OP_CancelTask",
        OP_COMMAND => "OP_Command",
        OP_DYNAMIC_WALL => "OP_DynamicWall",
        OP_GUILDS_LIST => "OP_GuildsList",
        OP_LF_GUILD => "OP_LFGuild",
        OP_LOAD_SPELL_SET => "OP_LoadSpellSet",
        OP_LOGIN => "OP_Login",
        OP_LOG_SERVER => "OP_LogServer",
        OP_MOTD => "OP_MOTD",
        OP_ON_LEVEL_MESSAGE => "OP_OnLevelMessage",
        OP_PLAY_MP3 => "OP_PlayMP3",
        OP_POTION_BELT => "OP_PotionBelt",
        OP_PVP_STATS => "OP_PVPStats",
        OP_REPORT => "OP_Report",
        OP_SPECIAL_MESG => "OP_SpecialMesg",
        OP_TASK_ACTIVITY => "OP_TaskActivity",
        OP_TASK_DESCRIPTION => "OP_TaskDescription",
        OP_ZONE_UNAVAIL => "OP_ZoneUnavail",
        NESTED_WORLD_SERVER => "Nested_WorldServer",
        NESTED_CHARACTER_SELECT_ENTRY => "Nested_CharacterSelectEntry",
        NESTED_CHAR_SELECT_EQUIP => "Nested_CharSelectEquip",
        NESTED_TINT => "Nested_Tint",
        NESTED_TEXTURE_PROFILE => "Nested_TextureProfile",
        NESTED_TINT_PROFILE => "Nested_TintProfile",
        NESTED_TRIBUTE_LEVEL => "Nested_TributeLevel",
        NESTED_BIND_STRUCT => "Nested_BindStruct",
        NESTED_AA_ARRAY => "Nested_AA_Array",
        NESTED_SPELL_BUFF => "Nested_SpellBuff",
        NESTED_DISCIPLINES => "Nested_Disciplines",
        NESTED_BANDOLIER => "Nested_Bandolier",
        NESTED_POTION_BELT => "Nested_PotionBelt",
        NESTED_TRIBUTE => "Nested_Tribute",
        NESTED_LEADERSHIP_AA => "Nested_LeadershipAA",
        NESTED_BAZAAR_WINDOW_START => "Nested_BazaarWindowStart",
        _ => return None,
    };
    Some(name)
}
