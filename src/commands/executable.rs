use crate::handler::{Dispatch, RespHandler};

/// A parsed command run against the connection's handler.
///
/// The handler is taken by value and handed back through the returned [`Dispatch`], so a command
/// may replace it (e.g. SUBSCRIBE switches the connection into subscriber mode).
pub trait Executable {
    fn exec(self, handler: RespHandler) -> Dispatch;
}
