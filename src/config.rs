use clap::Parser;
use std::net::IpAddr;

pub const DEFAULT_PORT: u16 = 6379;
pub const DEFAULT_MINIMUM_BUFFER_SIZE: usize = 4096;
pub const DEFAULT_WRITE_BUFFER_HIGH_WATER_MARK: usize = 64 * 1024;
pub const DEFAULT_MAX_FRAME_SIZE: usize = 512 * 1024 * 1024;
pub const DEFAULT_DELIVERY_QUEUE_CAPACITY: usize = 1024;

/// Server settings. Every option can also be set through its `RESPGRID_*` environment variable.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "respgrid", version, about)]
pub struct Config {
    /// The port to listen on
    #[arg(short, long, env = "RESPGRID_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// The address to bind to
    #[arg(short, long, env = "RESPGRID_BIND", default_value = "127.0.0.1")]
    pub bind: IpAddr,

    /// Smallest buffer allocated for outbound replies, in bytes
    #[arg(long, env = "RESPGRID_MINIMUM_BUFFER_SIZE", default_value_t = DEFAULT_MINIMUM_BUFFER_SIZE)]
    pub minimum_buffer_size: usize,

    /// Buffered reply bytes above which a connection stops reading until they are written
    #[arg(long, env = "RESPGRID_WRITE_BUFFER_HIGH_WATER_MARK", default_value_t = DEFAULT_WRITE_BUFFER_HIGH_WATER_MARK)]
    pub write_buffer_high_water_mark: usize,

    /// Largest request accepted, in bytes
    #[arg(long, env = "RESPGRID_MAX_FRAME_SIZE", default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    pub max_frame_size: usize,

    /// Pub/sub messages queued per connection before new ones are dropped
    #[arg(long, env = "RESPGRID_DELIVERY_QUEUE_CAPACITY", default_value_t = DEFAULT_DELIVERY_QUEUE_CAPACITY)]
    pub delivery_queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: IpAddr::from([127, 0, 0, 1]),
            minimum_buffer_size: DEFAULT_MINIMUM_BUFFER_SIZE,
            write_buffer_high_water_mark: DEFAULT_WRITE_BUFFER_HIGH_WATER_MARK,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            delivery_queue_capacity: DEFAULT_DELIVERY_QUEUE_CAPACITY,
        }
    }
}
