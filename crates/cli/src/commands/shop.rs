//! Interactive cart shell.
//!
//! Reads one command per line from stdin. A background task watches the
//! session and re-renders the cart whenever a mutation is applied.
//!
//! ```text
//! add <variant>       add a variant (global ID or numeric)
//! random              add a random product when the cart is empty
//! inc <line>          one more of cart line <line> (1-based)
//! dec <line>          one fewer of cart line <line>
//! qty <line> <n>      set the quantity of cart line <line>
//! rm <line>           remove cart line <line>
//! show                print the cart
//! reset               forget the cart
//! checkout            open checkout
//! quit                leave the shell
//! ```

#![allow(clippy::print_stdout)]

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::{Mutex, mpsc};
use url::Url;
use wrapsody_core::{CartLineId, OrderId, VariantId};
use wrapsody_storefront::{AppError, CartSession, CheckoutError, CheckoutEvent, CheckoutSurface};

use super::{Context, render};

/// Shared line reader; the shell and checkout prompt take turns on it.
type Input = Arc<Mutex<Lines<BufReader<Stdin>>>>;

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Add(VariantId),
    Random,
    Increment(usize),
    Decrement(usize),
    Quantity(usize, i64),
    Remove(usize),
    Show,
    Reset,
    Checkout,
    Help,
    Quit,
}

/// Parse one input line. `None` for blank lines.
///
/// # Errors
///
/// Returns a usage hint for unknown commands or bad arguments.
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let line_number = |arg: Option<&&str>| -> Result<usize, String> {
        arg.and_then(|raw| raw.parse::<usize>().ok())
            .filter(|n| *n >= 1)
            .ok_or_else(|| format!("usage: {verb} <line number>"))
    };

    let command = match verb {
        "add" => {
            let raw = args.first().ok_or("usage: add <variant>")?;
            Some(ShellCommand::Add(if raw.starts_with("gid://") {
                VariantId::new(*raw)
            } else {
                VariantId::from_resource_id(raw)
            }))
        }
        "random" => Some(ShellCommand::Random),
        "inc" => Some(ShellCommand::Increment(line_number(args.first())?)),
        "dec" => Some(ShellCommand::Decrement(line_number(args.first())?)),
        "rm" => Some(ShellCommand::Remove(line_number(args.first())?)),
        "qty" => {
            let line = line_number(args.first())?;
            let quantity = args
                .get(1)
                .and_then(|raw| raw.parse::<i64>().ok())
                .ok_or("usage: qty <line number> <quantity>")?;
            Some(ShellCommand::Quantity(line, quantity))
        }
        "show" => Some(ShellCommand::Show),
        "reset" => Some(ShellCommand::Reset),
        "checkout" => Some(ShellCommand::Checkout),
        "help" | "?" => Some(ShellCommand::Help),
        "quit" | "exit" => Some(ShellCommand::Quit),
        other => return Err(format!("unknown command `{other}`, try `help`")),
    };
    Ok(command)
}

/// Terminal stand-in for a checkout sheet.
///
/// Prints the checkout URL and waits for the buyer to report the outcome.
pub struct TerminalCheckout {
    input: Input,
}

/// Build the checkout surface for the shell.
#[must_use]
pub fn terminal_checkout() -> Arc<TerminalCheckout> {
    Arc::new(TerminalCheckout {
        input: Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines())),
    })
}

/// Turn the buyer's answer into a checkout event.
fn checkout_outcome(answer: Option<&str>) -> CheckoutEvent {
    let mut words = answer.unwrap_or_default().split_whitespace();
    match words.next() {
        Some("done") => CheckoutEvent::Completed {
            order_id: words.next().map(|raw| {
                if raw.starts_with("gid://") {
                    OrderId::new(raw)
                } else {
                    OrderId::from_resource_id(raw)
                }
            }),
        },
        Some("fail") => CheckoutEvent::Failed {
            message: words.collect::<Vec<_>>().join(" "),
            recoverable: true,
        },
        _ => CheckoutEvent::Canceled,
    }
}

#[async_trait]
impl CheckoutSurface for TerminalCheckout {
    async fn preload(&self, checkout_url: &Url) {
        tracing::debug!(url = %checkout_url, "Checkout ready");
    }

    async fn present(
        &self,
        checkout_url: &Url,
        events: mpsc::UnboundedSender<CheckoutEvent>,
    ) -> Result<(), CheckoutError> {
        println!("Open {checkout_url} to pay.");
        println!("Type `done [order id]` once the order is placed, anything else to cancel.");

        let answer = self
            .input
            .lock()
            .await
            .next_line()
            .await
            .map_err(|e| CheckoutError::Surface(e.to_string()))?;

        // The session may already be gone if the shell is shutting down
        let _ = events.send(checkout_outcome(answer.as_deref()));
        Ok(())
    }

    async fn invalidate(&self) {
        tracing::debug!("Checkout invalidated");
    }
}

/// The cart line at 1-based position `index`.
async fn line_at(session: &CartSession, index: usize) -> Result<CartLineId, AppError> {
    let cart = session.cart().await;
    cart.as_ref()
        .and_then(|cart| cart.lines.get(index.saturating_sub(1)))
        .map(|line| line.id.clone())
        .ok_or_else(|| AppError::NotFound(format!("Cart line {index}")))
}

async fn execute(ctx: &Context, command: ShellCommand) -> Result<(), AppError> {
    let session = &ctx.session;
    match command {
        ShellCommand::Add(variant_id) => {
            session.add_item(variant_id).await?;
        }
        ShellCommand::Random => {
            if session.inject_random_cart_item().await?.is_none() {
                render::message("The cart already has items.");
            }
        }
        ShellCommand::Increment(index) => {
            session.adjust_quantity(line_at(session, index).await?, 1).await?;
        }
        ShellCommand::Decrement(index) => {
            session.adjust_quantity(line_at(session, index).await?, -1).await?;
        }
        ShellCommand::Quantity(index, quantity) => {
            session
                .update_quantity(line_at(session, index).await?, quantity)
                .await?;
        }
        ShellCommand::Remove(index) => {
            session.remove_item(line_at(session, index).await?).await?;
        }
        ShellCommand::Show => render::cart(session.cart().await.as_ref()),
        ShellCommand::Reset => session.reset_cart().await,
        ShellCommand::Checkout => session.checkout().await?,
        ShellCommand::Help => render::message(
            "add <variant> | random | inc <line> | dec <line> | qty <line> <n> | rm <line> | show | reset | checkout | quit",
        ),
        ShellCommand::Quit => {}
    }
    Ok(())
}

/// Run the shell until `quit` or end of input.
///
/// # Errors
///
/// Returns an error only if stdin cannot be read; command failures are
/// reported and the shell continues.
pub async fn run(ctx: &Context, terminal: &TerminalCheckout) -> Result<(), AppError> {
    let mut changes = ctx.session.subscribe();
    let watcher = tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let cart = changes.borrow_and_update().clone();
            render::cart(cart.as_ref());
        }
    });

    render::message("Wrapsody shop. Type `help` for commands.");

    loop {
        let line = terminal
            .input
            .lock()
            .await
            .next_line()
            .await
            .map_err(|e| AppError::Internal(format!("failed to read input: {e}")))?;
        let Some(line) = line else { break };

        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(ShellCommand::Quit)) => break,
            Ok(Some(command)) => {
                if let Err(e) = execute(ctx, command).await {
                    e.report();
                    render::message(&format!("Error: {}", e.alert_message()));
                }
            }
            Err(usage) => render::message(&usage),
        }
    }

    watcher.abort();
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cart_commands() {
        assert_eq!(
            parse_command("add 42").unwrap(),
            Some(ShellCommand::Add(VariantId::from_resource_id(42)))
        );
        assert_eq!(
            parse_command("add gid://shopify/ProductVariant/42").unwrap(),
            Some(ShellCommand::Add(VariantId::from_resource_id(42)))
        );
        assert_eq!(
            parse_command("  qty 2 5 ").unwrap(),
            Some(ShellCommand::Quantity(2, 5))
        );
        assert_eq!(
            parse_command("qty 1 -3").unwrap(),
            Some(ShellCommand::Quantity(1, -3))
        );
        assert_eq!(
            parse_command("inc 1").unwrap(),
            Some(ShellCommand::Increment(1))
        );
        assert_eq!(parse_command("").unwrap(), None);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_command("inc 0").is_err());
        assert!(parse_command("rm").is_err());
        assert!(parse_command("qty 1").is_err());
        assert!(parse_command("add").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[test]
    fn test_checkout_outcome() {
        assert_eq!(
            checkout_outcome(Some("done 1001")),
            CheckoutEvent::Completed {
                order_id: Some(OrderId::from_resource_id(1001))
            }
        );
        assert_eq!(
            checkout_outcome(Some("done")),
            CheckoutEvent::Completed { order_id: None }
        );
        assert_eq!(checkout_outcome(Some("nah")), CheckoutEvent::Canceled);
        assert_eq!(checkout_outcome(None), CheckoutEvent::Canceled);
        assert!(matches!(
            checkout_outcome(Some("fail card declined")),
            CheckoutEvent::Failed { message, .. } if message == "card declined"
        ));
    }
}
