use chrono::Datelike;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    GetPromptRequestParams, GetPromptResult, ListPromptsResult, PaginatedRequestParams,
};
use rmcp::service::RequestContext;
use rmcp::{Json, RoleServer};
use rmcp::{prompt, prompt_handler, prompt_router, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use padpals_client::account::{self, AccountOverview, AuthRequest};
use padpals_client::admin::{self, AdminRequest, AdminRequestStatus};
use padpals_client::checkout::{self, CheckoutOutcome};
use padpals_client::navigation::{Navigator, Transition, View};
use padpals_client::session::{SessionContext, UserSession};
use padpals_client::store;
use padpals_client::{NewCycleEntry, Product, StorefrontClient};

pub mod domains;
pub mod error;
mod prompts;
pub mod state;
mod test_utils;

use domains::shop::{CartResult, cart_result, round_cents};
use domains::tracker::{
    CalendarResult, EntriesResult, EntryResult, StatisticsResult, entries_result, source_label,
};
use error::{McpError, McpResult};
use state::AppState;

#[derive(Clone)]
pub struct PadPalsMcpHandler {
    client: Arc<dyn StorefrontClient>,
    state: Arc<Mutex<AppState>>,
    session_path: Option<PathBuf>,
    tool_router: rmcp::handler::server::tool::ToolRouter<PadPalsMcpHandler>,
    prompt_router: rmcp::handler::server::router::prompt::PromptRouter<PadPalsMcpHandler>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct LoginParams {
    /// Email address or user name
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct SignUpParams {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct AdminApplyParams {
    /// Why the user wants admin access
    pub reason: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ListAdminRequestsParams {
    /// Only requests in this state; all when omitted
    pub status: Option<AdminRequestStatus>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ReviewAdminRequestParams {
    pub request_id: String,
    /// Approved or Denied
    pub decision: AdminRequestStatus,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ProductParams {
    pub product: Product,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct NavigateParams {
    pub view: View,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct AddToCartParams {
    pub product_id: String,
    pub variant_id: String,
    /// Subscription lines are 15% cheaper
    pub subscription: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct UpdateQuantityParams {
    pub variant_id: String,
    /// Positive to add units, negative to remove them
    pub delta: i64,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CalendarParams {
    /// Defaults to the current year
    pub year: Option<i32>,
    /// 1-12, defaults to the current month
    pub month: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CycleOverviewParams {
    pub months: Option<u32>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SessionResult {
    pub signed_in: bool,
    pub user: Option<UserSession>,
    pub view: View,
    pub cart_item_count: u32,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ProductsResult {
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct CheckoutResult {
    /// "placed" or "login_required"
    pub outcome: String,
    pub total: Option<f64>,
    pub item_count: Option<u32>,
    pub view: View,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct LoggedEntryResult {
    pub entry: EntryResult,
    pub statistics: StatisticsResult,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct AdminRequestResult {
    /// None when the user never applied
    pub request: Option<AdminRequest>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct AdminRequestsResult {
    pub requests: Vec<AdminRequest>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ReviewResult {
    pub request_id: String,
    pub status: AdminRequestStatus,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ProductResult {
    pub product: Product,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct RefreshResult {
    /// False when a newer refresh superseded this one
    pub applied: bool,
    pub source: String,
    pub entry_count: usize,
}

#[tool_router]
#[prompt_router]
impl PadPalsMcpHandler {
    /// Handler for a guest session without persistence.
    pub fn new(client: Arc<dyn StorefrontClient>) -> Self {
        Self::with_session(client, SessionContext::guest(), Navigator::new(), None)
    }

    pub fn with_session(
        client: Arc<dyn StorefrontClient>,
        session: SessionContext,
        navigator: Navigator,
        session_path: Option<PathBuf>,
    ) -> Self {
        Self {
            client,
            state: Arc::new(Mutex::new(AppState::new(session, navigator))),
            session_path,
            tool_router: Self::tool_router(),
            prompt_router: Self::prompt_router(),
        }
    }

    pub fn tool_count(&self) -> usize {
        self.tool_router.list_all().len()
    }

    pub fn prompt_count(&self) -> usize {
        self.prompt_router.list_all().len()
    }

    /// Populate the Entry Store for the current session.
    pub async fn bootstrap(&self) {
        self.refresh_entries().await;
    }

    /// Fetch entries without holding the state lock; a newer refresh wins.
    async fn refresh_entries(&self) -> bool {
        let (ticket, session) = {
            let mut st = self.state.lock().await;
            (st.entries.begin_refresh(), st.session.clone())
        };
        let fetched = store::fetch_for_session(self.client.as_ref(), &session).await;
        let mut st = self.state.lock().await;
        st.entries.apply_refresh(ticket, fetched)
    }

    async fn persist_session(&self, session: &SessionContext) -> McpResult<()> {
        if let Some(path) = &self.session_path {
            session.save(path).await?;
        }
        Ok(())
    }

    async fn session_snapshot(&self) -> SessionContext {
        self.state.lock().await.session.clone()
    }

    /// Authenticate without the state lock, then switch the session.
    async fn start_session(&self, request: AuthRequest) -> McpResult<SessionResult> {
        let user = account::sign_in(self.client.as_ref(), &request).await?;
        let session = {
            let mut st = self.state.lock().await;
            st.session.login(user);
            st.session.clone()
        };
        self.persist_session(&session).await?;
        self.refresh_entries().await;
        Ok(self.session_result().await)
    }

    async fn remember_product(&self, product: &Product) {
        let mut st = self.state.lock().await;
        match st.products.iter_mut().find(|p| p.id == product.id) {
            Some(cached) => *cached = product.clone(),
            None => st.products.push(product.clone()),
        }
    }

    async fn session_result(&self) -> SessionResult {
        let st = self.state.lock().await;
        SessionResult {
            signed_in: !st.session.is_guest(),
            user: st.session.user().cloned(),
            view: st.navigator.current(),
            cart_item_count: st.cart.item_count(),
        }
    }

    async fn find_product(&self, product_id: &str) -> McpResult<Product> {
        {
            let st = self.state.lock().await;
            if let Some(p) = st.products.iter().find(|p| p.id == product_id) {
                return Ok(p.clone());
            }
        }
        let products = self.client.list_products().await?;
        let found = products.iter().find(|p| p.id == product_id).cloned();
        self.state.lock().await.products = products;
        found.ok_or_else(|| McpError::NotFound(format!("product {product_id}")))
    }

    #[tool(name = "get_session", description = "Show the signed-in user, current view and cart size")]
    async fn get_session(&self) -> Result<Json<SessionResult>, String> {
        Ok(Json(self.session_result().await))
    }

    #[tool(
        name = "login",
        description = "Sign in with email or user name and password; roles come from the storefront"
    )]
    async fn login(&self, params: Parameters<LoginParams>) -> Result<Json<SessionResult>, String> {
        let p = params.0;
        let result = self
            .start_session(AuthRequest::login(p.identifier, p.password))
            .await?;
        Ok(Json(result))
    }

    #[tool(name = "sign_up", description = "Create a storefront account and sign in")]
    async fn sign_up(&self, params: Parameters<SignUpParams>) -> Result<Json<SessionResult>, String> {
        let p = params.0;
        let result = self
            .start_session(AuthRequest::signup(p.name, p.email, p.password))
            .await?;
        Ok(Json(result))
    }

    #[tool(name = "logout", description = "End the session and return to guest mode")]
    async fn logout(&self) -> Result<Json<SessionResult>, String> {
        let session = {
            let mut st = self.state.lock().await;
            st.session.logout();
            st.session.clone()
        };
        self.persist_session(&session).await?;
        self.refresh_entries().await;
        Ok(Json(self.session_result().await))
    }

    #[tool(name = "navigate", description = "Move to another storefront view")]
    async fn navigate(&self, params: Parameters<NavigateParams>) -> Result<Json<Transition>, String> {
        let mut st = self.state.lock().await;
        let st = &mut *st;
        let t = st
            .navigator
            .navigate(params.0.view, &st.session)
            .map_err(McpError::from)?;
        Ok(Json(t))
    }

    #[tool(
        name = "open_admin",
        description = "Open the admin panel matching the user's role"
    )]
    async fn open_admin(&self) -> Result<Json<Transition>, String> {
        let mut st = self.state.lock().await;
        let st = &mut *st;
        let t = st
            .navigator
            .admin_entry(&st.session)
            .map_err(McpError::from)?;
        Ok(Json(t))
    }

    #[tool(name = "list_products", description = "List the product catalogue")]
    async fn list_products(&self) -> Result<Json<ProductsResult>, String> {
        let products = self
            .client
            .list_products()
            .await
            .map_err(McpError::from)?;
        self.state.lock().await.products = products.clone();
        Ok(Json(ProductsResult { products }))
    }

    #[tool(name = "add_to_cart", description = "Add one unit of a product variant to the cart")]
    async fn add_to_cart(
        &self,
        params: Parameters<AddToCartParams>,
    ) -> Result<Json<CartResult>, String> {
        let p = params.0;
        let product = self.find_product(&p.product_id).await?;
        let variant = product.variant(&p.variant_id).ok_or_else(|| {
            McpError::NotFound(format!("variant {} of {}", p.variant_id, p.product_id))
        })?;
        let mut st = self.state.lock().await;
        st.cart.add(&product, variant, p.subscription.unwrap_or(false));
        Ok(Json(cart_result(&st.cart)))
    }

    #[tool(
        name = "update_cart_quantity",
        description = "Change the quantity of a variant in the cart; lines at zero are removed"
    )]
    async fn update_cart_quantity(
        &self,
        params: Parameters<UpdateQuantityParams>,
    ) -> Result<Json<CartResult>, String> {
        let p = params.0;
        let mut st = self.state.lock().await;
        st.cart.update_quantity(&p.variant_id, p.delta);
        Ok(Json(cart_result(&st.cart)))
    }

    #[tool(name = "view_cart", description = "Show cart lines and total")]
    async fn view_cart(&self) -> Result<Json<CartResult>, String> {
        let st = self.state.lock().await;
        Ok(Json(cart_result(&st.cart)))
    }

    #[tool(name = "checkout", description = "Place an order for the cart contents")]
    async fn checkout(&self) -> Result<Json<CheckoutResult>, String> {
        let (pending, session) = {
            let mut guard = self.state.lock().await;
            let st: &mut AppState = &mut guard;
            match checkout::prepare(&st.session, &st.cart).map_err(McpError::from)? {
                Some(pending) => (pending, st.session.clone()),
                None => {
                    let transition = st.navigator.redirect_to_login();
                    return Ok(Json(checkout_result(CheckoutOutcome::LoginRequired {
                        transition,
                    })));
                }
            }
        };
        checkout::submit(self.client.as_ref(), &pending)
            .await
            .map_err(McpError::from)?;
        let mut guard = self.state.lock().await;
        let st: &mut AppState = &mut guard;
        let outcome = checkout::settle(pending, &session, &mut st.cart, &mut st.navigator)
            .map_err(McpError::from)?;
        Ok(Json(checkout_result(outcome)))
    }

    #[tool(name = "list_cycle_entries", description = "List logged cycle entries")]
    async fn list_cycle_entries(&self) -> Result<Json<EntriesResult>, String> {
        let st = self.state.lock().await;
        Ok(Json(entries_result(&st.entries)))
    }

    #[tool(
        name = "refresh_cycle_entries",
        description = "Reload cycle entries from the tracker service"
    )]
    async fn refresh_cycle_entries(&self) -> Result<Json<RefreshResult>, String> {
        let applied = self.refresh_entries().await;
        let st = self.state.lock().await;
        Ok(Json(RefreshResult {
            applied,
            source: source_label(st.entries.source()).to_string(),
            entry_count: st.entries.entries().len(),
        }))
    }

    #[tool(
        name = "log_cycle_entry",
        description = "Log a period with start date, optional end date and flow (Light, Medium, Heavy)"
    )]
    async fn log_cycle_entry(
        &self,
        params: Parameters<NewCycleEntry>,
    ) -> Result<Json<LoggedEntryResult>, String> {
        let entry = params.0.validate().map_err(McpError::from)?;
        let session = self.session_snapshot().await;
        let saved = store::persist_remote(self.client.as_ref(), &session, &entry)
            .await
            .map_err(McpError::from)?;
        if saved {
            self.refresh_entries().await;
        } else {
            self.state.lock().await.entries.push_local(entry.clone());
        }
        let st = self.state.lock().await;
        Ok(Json(LoggedEntryResult {
            entry: EntryResult::from(&entry),
            statistics: StatisticsResult::from(&st.entries.statistics()),
        }))
    }

    #[tool(
        name = "get_cycle_statistics",
        description = "Average cycle length, average period length and predicted next start"
    )]
    async fn get_cycle_statistics(&self) -> Result<Json<StatisticsResult>, String> {
        let st = self.state.lock().await;
        Ok(Json(StatisticsResult::from(&st.entries.statistics())))
    }

    #[tool(
        name = "get_cycle_calendar",
        description = "Month calendar with logged and predicted period days"
    )]
    async fn get_cycle_calendar(
        &self,
        params: Parameters<CalendarParams>,
    ) -> Result<Json<CalendarResult>, String> {
        let p = params.0;
        let today = chrono::Local::now().date_naive();
        let year = p.year.unwrap_or_else(|| today.year());
        let month = p.month.unwrap_or_else(|| today.month());
        let st = self.state.lock().await;
        let cal = st.entries.calendar(year, month).map_err(McpError::from)?;
        Ok(Json(CalendarResult::from(&cal)))
    }

    #[tool(
        name = "get_account",
        description = "Order history and subscriptions of the signed-in user"
    )]
    async fn get_account(&self) -> Result<Json<AccountOverview>, String> {
        let session = self.session_snapshot().await;
        let overview = account::overview(self.client.as_ref(), &session)
            .await
            .map_err(McpError::from)?;
        Ok(Json(overview))
    }

    #[tool(
        name = "request_admin_access",
        description = "Apply for admin access; allowed when no request is open"
    )]
    async fn request_admin_access(
        &self,
        params: Parameters<AdminApplyParams>,
    ) -> Result<Json<AdminRequestResult>, String> {
        let session = self.session_snapshot().await;
        let request = admin::apply(self.client.as_ref(), &session, &params.0.reason)
            .await
            .map_err(McpError::from)?;
        Ok(Json(AdminRequestResult {
            request: Some(request),
        }))
    }

    #[tool(
        name = "get_admin_request",
        description = "Status of the signed-in user's admin access request"
    )]
    async fn get_admin_request(&self) -> Result<Json<AdminRequestResult>, String> {
        let session = self.session_snapshot().await;
        let request = admin::my_request(self.client.as_ref(), &session)
            .await
            .map_err(McpError::from)?;
        Ok(Json(AdminRequestResult { request }))
    }

    #[tool(
        name = "list_admin_requests",
        description = "Admin access requests awaiting review (super admins only)"
    )]
    async fn list_admin_requests(
        &self,
        params: Parameters<ListAdminRequestsParams>,
    ) -> Result<Json<AdminRequestsResult>, String> {
        let session = self.session_snapshot().await;
        let requests = admin::list_requests(self.client.as_ref(), &session, params.0.status)
            .await
            .map_err(McpError::from)?;
        Ok(Json(AdminRequestsResult { requests }))
    }

    #[tool(
        name = "review_admin_request",
        description = "Approve or deny an admin access request (super admins only)"
    )]
    async fn review_admin_request(
        &self,
        params: Parameters<ReviewAdminRequestParams>,
    ) -> Result<Json<ReviewResult>, String> {
        let p = params.0;
        let session = self.session_snapshot().await;
        admin::review(self.client.as_ref(), &session, &p.request_id, p.decision)
            .await
            .map_err(McpError::from)?;
        Ok(Json(ReviewResult {
            request_id: p.request_id,
            status: p.decision,
        }))
    }

    #[tool(name = "update_product", description = "Edit a catalogue product (admins only)")]
    async fn update_product(
        &self,
        params: Parameters<ProductParams>,
    ) -> Result<Json<ProductResult>, String> {
        let product = params.0.product;
        let session = self.session_snapshot().await;
        admin::update_product(self.client.as_ref(), &session, &product)
            .await
            .map_err(McpError::from)?;
        self.remember_product(&product).await;
        Ok(Json(ProductResult { product }))
    }

    #[tool(name = "create_product", description = "Add a product to the catalogue (admins only)")]
    async fn create_product(
        &self,
        params: Parameters<ProductParams>,
    ) -> Result<Json<ProductResult>, String> {
        let session = self.session_snapshot().await;
        let product = admin::create_product(self.client.as_ref(), &session, &params.0.product)
            .await
            .map_err(McpError::from)?;
        self.remember_product(&product).await;
        Ok(Json(ProductResult { product }))
    }

    /// Cycle summary with statistics and upcoming calendar months
    #[prompt(
        name = "cycle-overview",
        description = "Summarise logged cycles, predictions and supplies"
    )]
    async fn cycle_overview(&self, params: Parameters<CycleOverviewParams>) -> GetPromptResult {
        let months = params.0.months.unwrap_or(2).clamp(1, 12);
        prompts::cycle_overview_prompt(months)
    }
}

#[tool_handler]
#[prompt_handler(router = self.prompt_router)]
impl rmcp::ServerHandler for PadPalsMcpHandler {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo::new(
            rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .build(),
        )
        .with_instructions(
            "PadPals storefront MCP server - browse products, manage the cart and \
             checkout, track cycles with predictions and a month calendar, and \
             handle admin access requests and catalogue edits.",
        )
    }
}

fn checkout_result(outcome: CheckoutOutcome) -> CheckoutResult {
    match outcome {
        CheckoutOutcome::Placed {
            total,
            items,
            transition,
        } => CheckoutResult {
            outcome: "placed".into(),
            total: Some(round_cents(total)),
            item_count: Some(items),
            view: transition.to,
        },
        CheckoutOutcome::LoginRequired { transition } => CheckoutResult {
            outcome: "login_required".into(),
            total: None,
            item_count: None,
            view: transition.to,
        },
    }
}
