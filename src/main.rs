//! Storefront CLI - a terminal front-end for the Commerce storefront API.
//!
//! Thin command wrapper over the client library: browse the catalog, manage
//! the cart, place orders, and manage the login session.

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use storefront::api::ApiClient;
use storefront::auth::{FileStore, KeyringStore, Session, SessionStore};
use storefront::config::Config;
use storefront::models::ProductQuery;

/// Set to any value to keep tokens in the OS keychain instead of files
const KEYRING_ENV: &str = "STOREFRONT_USE_KEYRING";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn usage() {
    eprintln!("Usage: storefront <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  login <email>                 log in (prompts for password)");
    eprintln!("  register <name> <email> <phone>  create an account");
    eprintln!("  logout                        log out and clear the session");
    eprintln!("  whoami                        show the logged-in user");
    eprintln!("  products [keyword]            list or search products");
    eprintln!("  product <id>                  show one product");
    eprintln!("  categories                    list categories");
    eprintln!("  cart                          show the cart");
    eprintln!("  cart-add <product-id> [qty]   add a product to the cart");
    eprintln!("  cart-clear                    empty the cart");
    eprintln!("  checkout                      place an order from the cart");
    eprintln!("  orders                        list your orders");
    eprintln!("  order <id>                    show one order");
}

fn build_client(config: &Config) -> Result<ApiClient> {
    let files = FileStore::new(Config::session_dir()?);
    let store: Arc<dyn SessionStore> = if std::env::var(KEYRING_ENV).is_ok() {
        Arc::new(KeyringStore::new(files))
    } else {
        Arc::new(files)
    };
    let session = Arc::new(Session::new(store));
    Ok(ApiClient::new(config.api_url(), session)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1) else {
        usage();
        return Ok(());
    };

    let mut config = Config::load()?;
    let client = build_client(&config)?;
    info!(api_url = %config.api_url(), "storefront CLI starting");

    match command.as_str() {
        "login" => {
            let email = args
                .get(2)
                .cloned()
                .or_else(|| config.last_email.clone())
                .context("usage: storefront login <email>")?;
            let password = rpassword::prompt_password("Password: ")?;
            let user = client.login(&email, &password).await?;
            config.last_email = Some(email);
            config.save()?;
            println!("Logged in as {} <{}> ({})", user.name, user.email, user.role);
        }
        "register" => {
            let (name, email, phone) = match (args.get(2), args.get(3), args.get(4)) {
                (Some(name), Some(email), Some(phone)) => (name, email, phone),
                _ => anyhow::bail!("usage: storefront register <name> <email> <phone>"),
            };
            let password = rpassword::prompt_password("Password: ")?;
            let confirm = rpassword::prompt_password("Confirm password: ")?;
            if password != confirm {
                anyhow::bail!("passwords do not match");
            }
            let user = client.register(name, email, &password, phone).await?;
            config.last_email = Some(email.clone());
            config.save()?;
            println!("Registered {} <{}>", user.name, user.email);
        }
        "logout" => {
            client.logout().await?;
            println!("Logged out");
        }
        "whoami" => match client.session().user()? {
            Some(user) => println!("{} <{}> ({})", user.name, user.email, user.role),
            None => println!("Not logged in"),
        },
        "products" => {
            let query = ProductQuery {
                keyword: args.get(2).cloned(),
                ..Default::default()
            };
            let page = client.products(&query).await?;
            for product in &page.content {
                println!(
                    "{:>6}  {:<32}  {:>10}  {}",
                    product.id,
                    product.name,
                    product.display_price(),
                    if product.in_stock() { "" } else { "out of stock" }
                );
            }
            println!(
                "page {}/{} ({} products)",
                page.number + 1,
                page.total_pages.max(1),
                page.total_elements
            );
        }
        "product" => {
            let id = parse_id(args.get(2), "storefront product <id>")?;
            let product = client.product(id).await?;
            println!("{} ({})", product.name, product.display_price());
            if let Some(ref category) = product.category_name {
                println!("Category: {}", category);
            }
            println!("Stock: {}", product.stock);
            if !product.description.is_empty() {
                println!("{}", product.description);
            }
        }
        "categories" => {
            for category in client.categories().await? {
                println!("{:>6}  {}", category.id, category.name);
            }
        }
        "cart" => {
            let cart = client.cart().await?;
            if cart.is_empty() {
                println!("Cart is empty");
            } else {
                for item in &cart.items {
                    println!(
                        "{:>6}  {:<32}  {} x {:.2} = {:.2}",
                        item.id,
                        item.product_name,
                        item.quantity,
                        item.price,
                        item.line_total()
                    );
                }
                println!("Total: {:.2}", cart.total_amount);
            }
        }
        "cart-add" => {
            let product_id = parse_id(args.get(2), "storefront cart-add <product-id> [qty]")?;
            let quantity: u32 = match args.get(3) {
                Some(raw) => raw.parse().context("quantity must be a number")?,
                None => 1,
            };
            let cart = client.add_to_cart(product_id, quantity).await?;
            println!("Cart now holds {} item(s), total {:.2}", cart.item_count(), cart.total_amount);
        }
        "cart-clear" => {
            client.clear_cart().await?;
            println!("Cart cleared");
        }
        "checkout" => {
            let order = client.create_order().await?;
            println!("Order {} placed, status {}, total {:.2}", order.order_id, order.status, order.total_amount);
        }
        "orders" => {
            for order in client.orders().await? {
                println!(
                    "{:>6}  {:<10}  {:>10.2}",
                    order.order_id, order.status, order.total_amount
                );
            }
        }
        "order" => {
            let id = parse_id(args.get(2), "storefront order <id>")?;
            let order = client.order(id).await?;
            println!("Order {} - {} - total {:.2}", order.order_id, order.status, order.total_amount);
            for item in &order.items {
                println!("  product {} x {} = {:.2}", item.product_id, item.quantity, item.amount);
            }
        }
        _ => {
            usage();
            anyhow::bail!("unknown command: {}", command);
        }
    }

    Ok(())
}

fn parse_id(arg: Option<&String>, usage_line: &str) -> Result<i64> {
    arg.with_context(|| format!("usage: {}", usage_line))?
        .parse()
        .context("id must be a number")
}
