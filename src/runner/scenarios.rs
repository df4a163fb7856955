//! Scenario catalogue
//!
//! Each scenario drives the page façades through one user journey and turns
//! a broken expectation into an `Err` carrying the reason.

use crate::engine::Engine;
use crate::pages::{CartPage, LoginPage, ProductsPage, SamplePage};
use anyhow::{bail, Context, Result};
use std::fmt;

pub const VALID_USER: &str = "standard_user";
pub const VALID_PASS: &str = "secret_sauce";
pub const SORT_LABEL: &str = "Price (low to high)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    LoginValid,
    LoginInvalid,
    Logout,
    CatalogDetails,
    AddToCart,
    SortByPrice,
    UiElements,
}

/// How a scenario ended when it did not error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioOutcome {
    Passed,
    Skipped(String),
}

impl Scenario {
    pub const ALL: [Scenario; 7] = [
        Scenario::LoginValid,
        Scenario::LoginInvalid,
        Scenario::Logout,
        Scenario::CatalogDetails,
        Scenario::AddToCart,
        Scenario::SortByPrice,
        Scenario::UiElements,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::LoginValid => "login_valid",
            Scenario::LoginInvalid => "login_invalid",
            Scenario::Logout => "logout",
            Scenario::CatalogDetails => "catalog_details",
            Scenario::AddToCart => "add_to_cart",
            Scenario::SortByPrice => "sort_by_price",
            Scenario::UiElements => "ui_elements",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Resolve CLI names; an empty list selects every scenario
    pub fn select(names: &[String]) -> Result<Vec<Scenario>> {
        if names.is_empty() {
            return Ok(Self::ALL.to_vec());
        }
        names
            .iter()
            .map(|n| {
                Self::from_name(n).with_context(|| {
                    let known: Vec<&str> = Self::ALL.iter().map(|s| s.name()).collect();
                    format!("Unknown scenario '{}' (known: {})", n, known.join(", "))
                })
            })
            .collect()
    }

    pub async fn run(&self, engine: &Engine) -> Result<ScenarioOutcome> {
        match self {
            Scenario::LoginValid => login_valid(engine).await,
            Scenario::LoginInvalid => login_invalid(engine).await,
            Scenario::Logout => logout(engine).await,
            Scenario::CatalogDetails => catalog_details(engine).await,
            Scenario::AddToCart => add_to_cart(engine).await,
            Scenario::SortByPrice => sort_by_price(engine).await,
            Scenario::UiElements => ui_elements(engine).await,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Log in with the standard account and wait for the catalog
async fn sign_in(engine: &Engine) -> Result<()> {
    let outcome = LoginPage::new(engine).login(VALID_USER, VALID_PASS).await?;
    if !outcome.rejected_fields.is_empty() {
        bail!("text entry rejected for: {}", outcome.rejected_fields.join(", "));
    }
    if !outcome.submitted() {
        bail!("login form could not be submitted");
    }
    if !ProductsPage::new(engine).wait_for_products().await {
        bail!("catalog not visible after login");
    }
    Ok(())
}

async fn login_valid(engine: &Engine) -> Result<ScenarioOutcome> {
    sign_in(engine).await?;
    Ok(ScenarioOutcome::Passed)
}

async fn login_invalid(engine: &Engine) -> Result<ScenarioOutcome> {
    let page = LoginPage::new(engine);
    let outcome = page.login("invalid_user", "wrong_password").await?;
    if !outcome.rejected_fields.is_empty() {
        bail!("text entry rejected for: {}", outcome.rejected_fields.join(", "));
    }
    if !outcome.submitted() {
        bail!("login form could not be submitted");
    }
    let error = page.get_error_text(engine.config().error_wait()).await;
    if error.is_empty() {
        bail!("expected an error message for invalid login");
    }
    log::info!("login error shown: {}", error);
    Ok(ScenarioOutcome::Passed)
}

async fn logout(engine: &Engine) -> Result<ScenarioOutcome> {
    sign_in(engine).await?;
    if !LoginPage::new(engine).logout().await {
        bail!("username field not visible after logout");
    }
    Ok(ScenarioOutcome::Passed)
}

async fn catalog_details(engine: &Engine) -> Result<ScenarioOutcome> {
    sign_in(engine).await?;
    let products = ProductsPage::new(engine);
    let titles = products.get_all_product_titles().await;
    let Some(first) = titles.first() else {
        bail!("no products found in catalog");
    };
    if !products.open_product_details(first).await {
        bail!("could not open details for '{}'", first);
    }
    if !engine
        .poll_tree(|tree| tree.contains(first.as_str()), engine.config().transition_timeout())
        .await
        .matched
    {
        bail!("details page does not show '{}'", first);
    }
    Ok(ScenarioOutcome::Passed)
}

async fn add_to_cart(engine: &Engine) -> Result<ScenarioOutcome> {
    sign_in(engine).await?;
    let products = ProductsPage::new(engine);
    let titles = products.get_all_product_titles().await;
    if titles.is_empty() {
        bail!("no products found");
    }

    let added = products.add_first_product_to_cart().await;
    if added.is_empty() {
        bail!("no product could be added to the cart");
    }

    let cart = CartPage::new(engine);
    if !cart.open_cart().await {
        bail!("cart did not open");
    }
    let items = cart.get_cart_items().await;
    if items.is_empty() {
        bail!("no items found in the cart");
    }
    if !items.iter().any(|item| item.contains(added.as_str())) {
        bail!("'{}' not found in cart items: {:?}", added, items);
    }
    Ok(ScenarioOutcome::Passed)
}

async fn sort_by_price(engine: &Engine) -> Result<ScenarioOutcome> {
    sign_in(engine).await?;
    let products = ProductsPage::new(engine);

    if !products
        .is_sort_present(engine.config().probe_timeout())
        .await
    {
        return Ok(ScenarioOutcome::Skipped(
            "sort control not found on this build".into(),
        ));
    }
    if !products.open_sort_menu().await {
        return Ok(ScenarioOutcome::Skipped("sort menu did not open".into()));
    }
    if !products.select_sort_option(SORT_LABEL).await {
        return Ok(ScenarioOutcome::Skipped(format!(
            "sort option '{}' not found on this build",
            SORT_LABEL
        )));
    }

    let prices = products.collect_visible_prices().await;
    if prices.is_empty() {
        bail!("no prices found after sorting");
    }
    if prices.windows(2).any(|w| w[0] > w[1]) {
        bail!("prices not sorted ascending: {:?}", prices);
    }
    Ok(ScenarioOutcome::Passed)
}

async fn ui_elements(engine: &Engine) -> Result<ScenarioOutcome> {
    let sample = SamplePage::new(engine);
    if !sample.wait_for_app().await {
        bail!("sample app did not load");
    }
    if !sample.open_ui_elements().await {
        bail!("UI elements entry not reachable");
    }
    let text = sample.get_text_from_button().await;
    if text.is_empty() {
        bail!("expected static text after pressing the text button");
    }
    if !sample.open_alert_and_close().await {
        bail!("alert could not be opened and closed");
    }
    Ok(ScenarioOutcome::Passed)
}
