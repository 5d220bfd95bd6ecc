//! The error slot must hold a `std::error::Error`.

use apikit::{Dispatcher, ErrorCodeTable, RequestCtx};

#[derive(Debug)]
struct Status {
    code: u16,
}

async fn handler(_ctx: RequestCtx) -> Result<(), Status> {
    Err(Status { code: 418 })
}

fn main() {
    let dispatcher = Dispatcher::new(ErrorCodeTable::builder().build());
    let _ = dispatcher.handle(handler);
}
