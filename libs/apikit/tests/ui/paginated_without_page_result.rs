//! A handler taking a page query must return a page result.

use apikit::{Dispatcher, ErrorCodeTable, PageQuery, RequestCtx};

#[derive(Debug)]
struct Nope;

impl std::fmt::Display for Nope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("nope")
    }
}

impl std::error::Error for Nope {}

async fn handler(_ctx: RequestCtx, _page: PageQuery) -> Result<String, Nope> {
    Ok("one note".to_owned())
}

fn main() {
    let dispatcher = Dispatcher::new(ErrorCodeTable::builder().build());
    let _ = dispatcher.handle(handler);
}
