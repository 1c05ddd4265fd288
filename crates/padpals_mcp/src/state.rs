use padpals_client::cart::Cart;
use padpals_client::navigation::Navigator;
use padpals_client::session::SessionContext;
use padpals_client::store::EntryStore;
use padpals_client::Product;

/// Everything one storefront session mutates, guarded by a single mutex in the handler.
#[derive(Debug, Default)]
pub struct AppState {
    pub session: SessionContext,
    pub navigator: Navigator,
    pub cart: Cart,
    pub entries: EntryStore,
    pub products: Vec<Product>,
}

impl AppState {
    pub fn new(session: SessionContext, navigator: Navigator) -> Self {
        Self {
            session,
            navigator,
            ..Default::default()
        }
    }
}
