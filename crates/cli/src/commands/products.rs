//! `neotech products` command.

use super::Context;

/// Print the catalog, one product per line.
///
/// # Errors
///
/// Returns an error if the catalog cannot be fetched.
pub async fn list(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let products = ctx.api.list_products().await?;
    if products.is_empty() {
        println!("No products");
        return Ok(());
    }

    for product in products.iter() {
        println!("{:>5}  {:<40} {:>10}", product.id, product.name, product.price.to_string());
    }
    Ok(())
}
