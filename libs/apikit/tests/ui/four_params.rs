//! Four parameters: no shape takes more than three.

use apikit::{Dispatcher, ErrorCodeTable, PageQuery, RequestCtx};

#[derive(Debug)]
struct Nope;

impl std::fmt::Display for Nope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("nope")
    }
}

impl std::error::Error for Nope {}

async fn handler(_ctx: RequestCtx, _a: PageQuery, _b: PageQuery, _n: u32) -> Result<(), Nope> {
    Ok(())
}

fn main() {
    let dispatcher = Dispatcher::new(ErrorCodeTable::builder().build());
    let _ = dispatcher.handle(handler);
}
