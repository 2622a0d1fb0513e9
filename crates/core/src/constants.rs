/// Price of a single tile, in cents, when a game does not set one.
pub const DEFAULT_TILE_PRICE: i64 = 100;

/// Maximum number of destinations carried by one bulk email call.
pub const BULK_EMAIL_BATCH_SIZE: usize = 50;

/// Template for winners whose mailing address is on file.
pub const WINNER_TEMPLATE: &str = "winning-template";

/// Template for winners who still have to provide a mailing address.
pub const WINNER_NEEDS_LOCATION_TEMPLATE: &str = "winning-template-need-location";

/// Messages queued per relay subscriber before new ones are dropped for it.
pub const RELAY_SUBSCRIBER_BUFFER: usize = 256;
