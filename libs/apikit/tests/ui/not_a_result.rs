//! The last return value must be the error slot.

use apikit::{Dispatcher, ErrorCodeTable, RequestCtx};

async fn handler(_ctx: RequestCtx) -> String {
    "pong".to_owned()
}

fn main() {
    let dispatcher = Dispatcher::new(ErrorCodeTable::builder().build());
    let _ = dispatcher.handle(handler);
}
