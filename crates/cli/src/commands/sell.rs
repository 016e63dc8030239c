//! Seller listing command.

#![allow(clippy::print_stdout)]

use suturahub_storefront::error::AppError;
use suturahub_storefront::models::{ListingForm, ListingImage};
use suturahub_storefront::state::AppState;

use crate::SellArgs;

/// Build the listing from arguments and publish it.
pub async fn submit(state: &AppState, args: SellArgs) -> Result<(), AppError> {
    let mut form = ListingForm {
        category: args.category,
        sub_category: args.sub_category,
        title: args.title,
        description: args.description,
        price: Some(args.price),
        quantity: Some(args.quantity),
        delivery_time: args.delivery_time,
        discount_percent: args.discount_percent,
        ..ListingForm::default()
    };
    for size in &args.sizes {
        form.toggle_size(size);
    }
    for color in &args.colors {
        form.toggle_color(color);
    }
    for tag in &args.tags {
        form.add_tag(tag);
    }

    let images = args
        .images
        .iter()
        .map(|path| ListingImage::from_path(path))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(price) = form.discounted_price() {
        println!("Discounted price: {price}");
    }

    let message = state.listings().submit(&form, &images).await?;
    println!("{message}");
    Ok(())
}
