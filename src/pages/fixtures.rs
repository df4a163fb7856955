//! Captured Swag Labs screens for façade and runner tests

use crate::driver::replay::ReplaySession;
use crate::engine::Engine;
use crate::utils::config::Config;
use std::sync::Arc;

pub const LOGIN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<AppiumAUT>
  <XCUIElementTypeApplication type="XCUIElementTypeApplication" name="Swag Labs" label="Swag Labs" x="0" y="0" width="390" height="844">
    <XCUIElementTypeOther type="XCUIElementTypeOther" name="test-Login" x="0" y="0" width="390" height="844">
      <XCUIElementTypeTextField type="XCUIElementTypeTextField" name="test-Username" value="Username" x="20" y="300" width="350" height="44"/>
      <XCUIElementTypeSecureTextField type="XCUIElementTypeSecureTextField" name="test-Password" value="Password" x="20" y="360" width="350" height="44"/>
      <XCUIElementTypeButton type="XCUIElementTypeButton" name="test-LOGIN" label="LOGIN" x="20" y="430" width="350" height="44"/>
    </XCUIElementTypeOther>
  </XCUIElementTypeApplication>
</AppiumAUT>"#;

/// Login screen of an older build: no accessibility identifiers
pub const LOGIN_UNLABELLED: &str = r#"<AppiumAUT>
  <XCUIElementTypeApplication type="XCUIElementTypeApplication" name="Swag Labs" x="0" y="0" width="390" height="844">
    <XCUIElementTypeTextField type="XCUIElementTypeTextField" value="username" x="20" y="300" width="350" height="44"/>
    <XCUIElementTypeSecureTextField type="XCUIElementTypeSecureTextField" value="password" x="20" y="360" width="350" height="44"/>
    <XCUIElementTypeButton type="XCUIElementTypeButton" label="Log In" x="20" y="430" width="350" height="44"/>
  </XCUIElementTypeApplication>
</AppiumAUT>"#;

pub const LOGIN_ERROR: &str = r#"<AppiumAUT>
  <XCUIElementTypeApplication type="XCUIElementTypeApplication" name="Swag Labs" x="0" y="0" width="390" height="844">
    <XCUIElementTypeTextField type="XCUIElementTypeTextField" name="test-Username" value="invalid_user" x="20" y="300" width="350" height="44"/>
    <XCUIElementTypeSecureTextField type="XCUIElementTypeSecureTextField" name="test-Password" value="••••" x="20" y="360" width="350" height="44"/>
    <XCUIElementTypeButton type="XCUIElementTypeButton" name="test-LOGIN" label="LOGIN" x="20" y="430" width="350" height="44"/>
    <XCUIElementTypeOther type="XCUIElementTypeOther" name="test-Error message" x="20" y="500" width="350" height="60">
      <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" label="Epic sadface: Username and password do not match any user in this service." x="30" y="510" width="330" height="40"/>
    </XCUIElementTypeOther>
  </XCUIElementTypeApplication>
</AppiumAUT>"#;

pub const PRODUCTS: &str = r#"<AppiumAUT>
  <XCUIElementTypeApplication type="XCUIElementTypeApplication" name="Swag Labs" x="0" y="0" width="390" height="844">
    <XCUIElementTypeOther type="XCUIElementTypeOther" name="test-Menu" x="10" y="50" width="40" height="40"/>
    <XCUIElementTypeOther type="XCUIElementTypeOther" name="test-Cart" x="330" y="50" width="40" height="40"/>
    <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" label="PRODUCTS" x="20" y="110" width="150" height="30"/>
    <XCUIElementTypeOther type="XCUIElementTypeOther" name="test-Modal Selector Button" x="330" y="110" width="40" height="30"/>
    <XCUIElementTypeOther type="XCUIElementTypeOther" name="test-Item" x="0" y="160" width="390" height="300">
      <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" name="test-Item title" label="Sauce Labs Backpack" x="20" y="380" width="250" height="20"/>
      <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" name="test-Price" label="$29.99" x="20" y="410" width="80" height="20"/>
      <XCUIElementTypeOther type="XCUIElementTypeOther" name="test-ADD TO CART" label="ADD TO CART" x="200" y="410" width="170" height="40"/>
    </XCUIElementTypeOther>
    <XCUIElementTypeOther type="XCUIElementTypeOther" name="test-Item" x="0" y="470" width="390" height="300">
      <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" name="test-Item title" label="Sauce Labs Bike Light" x="20" y="690" width="250" height="20"/>
      <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" name="test-Price" label="$9.99" x="20" y="720" width="80" height="20"/>
      <XCUIElementTypeOther type="XCUIElementTypeOther" name="test-ADD TO CART" label="ADD TO CART" x="200" y="720" width="170" height="40"/>
    </XCUIElementTypeOther>
  </XCUIElementTypeApplication>
</AppiumAUT>"#;

/// Catalog where the add buttons live outside the item containers
pub const PRODUCTS_FLAT: &str = r#"<AppiumAUT>
  <XCUIElementTypeApplication type="XCUIElementTypeApplication" name="Swag Labs" x="0" y="0" width="390" height="844">
    <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" label="PRODUCTS" x="20" y="110" width="150" height="30"/>
    <XCUIElementTypeOther type="XCUIElementTypeOther" x="0" y="160" width="390" height="300">
      <XCUIElementTypeOther type="XCUIElementTypeOther" x="0" y="160" width="390" height="300">
        <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" label="Sauce Labs Onesie" x="20" y="380" width="250" height="20"/>
        <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" label="$7.99" x="20" y="410" width="80" height="20"/>
        <XCUIElementTypeOther type="XCUIElementTypeOther" x="200" y="410" width="170" height="40">
          <XCUIElementTypeButton type="XCUIElementTypeButton" label="ADD TO CART" x="200" y="410" width="170" height="40"/>
        </XCUIElementTypeOther>
      </XCUIElementTypeOther>
    </XCUIElementTypeOther>
  </XCUIElementTypeApplication>
</AppiumAUT>"#;

pub const SORT_MENU: &str = r#"<AppiumAUT>
  <XCUIElementTypeApplication type="XCUIElementTypeApplication" name="Swag Labs" x="0" y="0" width="390" height="844">
    <XCUIElementTypeOther type="XCUIElementTypeOther" name="Name (A to Z)" label="Name (A to Z)" x="0" y="500" width="390" height="50"/>
    <XCUIElementTypeOther type="XCUIElementTypeOther" name="Name (Z to A)" label="Name (Z to A)" x="0" y="550" width="390" height="50"/>
    <XCUIElementTypeOther type="XCUIElementTypeOther" name="Price (low to high)" label="Price (low to high)" x="0" y="600" width="390" height="50"/>
    <XCUIElementTypeOther type="XCUIElementTypeOther" name="Price (high to low)" label="Price (high to low)" x="0" y="650" width="390" height="50"/>
    <XCUIElementTypeOther type="XCUIElementTypeOther" name="Cancel" label="Cancel" x="0" y="700" width="390" height="50"/>
  </XCUIElementTypeApplication>
</AppiumAUT>"#;

/// Sort sheet whose options expose only a content label
pub const SORT_MENU_LABELS_ONLY: &str = r#"<AppiumAUT>
  <XCUIElementTypeApplication type="XCUIElementTypeApplication" x="0" y="0" width="390" height="844">
    <XCUIElementTypeOther type="XCUIElementTypeOther" label="Sort items by Price (low to high)" x="0" y="600" width="390" height="50"/>
    <XCUIElementTypeOther type="XCUIElementTypeOther" label="Sort items by Price (high to low)" x="0" y="650" width="390" height="50"/>
  </XCUIElementTypeApplication>
</AppiumAUT>"#;

pub const PRODUCTS_SORTED: &str = r#"<AppiumAUT>
  <XCUIElementTypeApplication type="XCUIElementTypeApplication" name="Swag Labs" x="0" y="0" width="390" height="844">
    <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" label="PRODUCTS" x="20" y="110" width="150" height="30"/>
    <XCUIElementTypeOther type="XCUIElementTypeOther" name="test-Item" x="0" y="160" width="390" height="300">
      <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" name="test-Item title" label="Sauce Labs Onesie" x="20" y="380" width="250" height="20"/>
      <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" name="test-Price" label="$7.99" x="20" y="410" width="80" height="20"/>
    </XCUIElementTypeOther>
    <XCUIElementTypeOther type="XCUIElementTypeOther" name="test-Item" x="0" y="470" width="390" height="300">
      <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" name="test-Item title" label="Sauce Labs Bike Light" x="20" y="690" width="250" height="20"/>
      <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" name="test-Price" label="$9.99" x="20" y="720" width="80" height="20"/>
    </XCUIElementTypeOther>
    <XCUIElementTypeOther type="XCUIElementTypeOther" name="test-Item" x="0" y="780" width="390" height="300">
      <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" name="test-Item title" label="Sauce Labs Backpack" x="20" y="800" width="250" height="20"/>
      <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" name="test-Price" label="$29.99" x="20" y="830" width="80" height="20"/>
    </XCUIElementTypeOther>
  </XCUIElementTypeApplication>
</AppiumAUT>"#;

pub const DETAILS: &str = r#"<AppiumAUT>
  <XCUIElementTypeApplication type="XCUIElementTypeApplication" name="Swag Labs" x="0" y="0" width="390" height="844">
    <XCUIElementTypeOther type="XCUIElementTypeOther" name="test-BACK TO PRODUCTS" label="BACK TO PRODUCTS" x="10" y="100" width="200" height="40"/>
    <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" label="Sauce Labs Backpack" x="20" y="400" width="250" height="20"/>
    <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" label="$29.99" x="20" y="430" width="80" height="20"/>
  </XCUIElementTypeApplication>
</AppiumAUT>"#;

pub const CART: &str = r#"<AppiumAUT>
  <XCUIElementTypeApplication type="XCUIElementTypeApplication" name="Swag Labs" x="0" y="0" width="390" height="844">
    <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" label="YOUR CART" x="20" y="110" width="150" height="30"/>
    <XCUIElementTypeOther type="XCUIElementTypeOther" name="test-Item" x="0" y="160" width="390" height="120">
      <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" label="1" x="20" y="170" width="20" height="20"/>
      <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" label="Sauce Labs Backpack" x="60" y="170" width="250" height="20"/>
      <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" label="$29.99" x="60" y="200" width="80" height="20"/>
    </XCUIElementTypeOther>
    <XCUIElementTypeOther type="XCUIElementTypeOther" name="test-CHECKOUT" label="CHECKOUT" x="20" y="700" width="350" height="44"/>
  </XCUIElementTypeApplication>
</AppiumAUT>"#;

pub const MENU: &str = r#"<AppiumAUT>
  <XCUIElementTypeApplication type="XCUIElementTypeApplication" name="Swag Labs" x="0" y="0" width="390" height="844">
    <XCUIElementTypeOther type="XCUIElementTypeOther" name="test-ALL ITEMS" label="ALL ITEMS" x="20" y="200" width="300" height="40"/>
    <XCUIElementTypeOther type="XCUIElementTypeOther" name="test-LOGOUT" label="LOGOUT" x="20" y="260" width="300" height="40"/>
  </XCUIElementTypeApplication>
</AppiumAUT>"#;

pub const SAMPLE_HOME: &str = r#"<AppiumAUT>
  <XCUIElementTypeApplication type="XCUIElementTypeApplication" name="UICatalog" x="0" y="0" width="390" height="844">
    <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" name="test-Title" label="Welcome to the sample app" x="20" y="100" width="350" height="30"/>
    <XCUIElementTypeButton type="XCUIElementTypeButton" name="test-UI Elements" label="UI Elements" x="20" y="200" width="350" height="44"/>
  </XCUIElementTypeApplication>
</AppiumAUT>"#;

pub const SAMPLE_ELEMENTS: &str = r#"<AppiumAUT>
  <XCUIElementTypeApplication type="XCUIElementTypeApplication" name="UICatalog" x="0" y="0" width="390" height="844">
    <XCUIElementTypeButton type="XCUIElementTypeButton" name="test-Text Button" label="Text Button" x="20" y="200" width="350" height="44"/>
    <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" name="test-Text" label="" x="20" y="260" width="350" height="30"/>
    <XCUIElementTypeButton type="XCUIElementTypeButton" name="test-Alert" label="Alert" x="20" y="320" width="350" height="44"/>
  </XCUIElementTypeApplication>
</AppiumAUT>"#;

pub const SAMPLE_TEXT_SHOWN: &str = r#"<AppiumAUT>
  <XCUIElementTypeApplication type="XCUIElementTypeApplication" name="UICatalog" x="0" y="0" width="390" height="844">
    <XCUIElementTypeButton type="XCUIElementTypeButton" name="test-Text Button" label="Text Button" x="20" y="200" width="350" height="44"/>
    <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" name="test-Text" label="Hello World!" x="20" y="260" width="350" height="30"/>
    <XCUIElementTypeButton type="XCUIElementTypeButton" name="test-Alert" label="Alert" x="20" y="320" width="350" height="44"/>
  </XCUIElementTypeApplication>
</AppiumAUT>"#;

pub const SAMPLE_ALERT: &str = r#"<AppiumAUT>
  <XCUIElementTypeApplication type="XCUIElementTypeApplication" name="UICatalog" x="0" y="0" width="390" height="844">
    <XCUIElementTypeAlert type="XCUIElementTypeAlert" name="Alert" label="Alert" x="50" y="300" width="290" height="150">
      <XCUIElementTypeStaticText type="XCUIElementTypeStaticText" label="This is an alert" x="60" y="320" width="270" height="20"/>
      <XCUIElementTypeButton type="XCUIElementTypeButton" name="OK" label="OK" x="60" y="400" width="270" height="40"/>
    </XCUIElementTypeAlert>
  </XCUIElementTypeApplication>
</AppiumAUT>"#;

/// Short budgets so failing paths finish quickly
pub fn fast_config() -> Config {
    Config {
        probe_timeout_ms: 150,
        last_chance_ms: 200,
        poll_interval_ms: 30,
        error_wait_ms: 300,
        products_timeout_ms: 400,
        transition_timeout_ms: 400,
        option_wait_ms: 150,
        ..Config::default()
    }
}

/// The whole Swag Labs app, starting at the login screen
pub fn swag_app() -> ReplaySession {
    ReplaySession::new("login", LOGIN)
        .and_then(|s| s.with_screen("products", PRODUCTS))
        .and_then(|s| s.with_screen("sort", SORT_MENU))
        .and_then(|s| s.with_screen("sorted", PRODUCTS_SORTED))
        .and_then(|s| s.with_screen("details", DETAILS))
        .and_then(|s| s.with_screen("cart", CART))
        .and_then(|s| s.with_screen("menu", MENU))
        .expect("fixture screens parse")
        .with_transition("login", "tap", Some("test-LOGIN"), "products")
        .with_transition("products", "tap", Some("test-Modal Selector Button"), "sort")
        .with_transition("products", "tap", Some("test-Cart"), "cart")
        .with_transition("products", "tap", Some("test-Menu"), "menu")
        .with_transition("products", "tap", Some("Sauce Labs Backpack"), "details")
        .with_transition("sort", "tap", Some("Price (low to high)"), "sorted")
        .with_transition("menu", "tap", Some("test-LOGOUT"), "login")
}

pub fn engine(session: ReplaySession) -> (Arc<ReplaySession>, Engine) {
    let session = Arc::new(session);
    let engine = Engine::new(session.clone(), fast_config());
    (session, engine)
}
