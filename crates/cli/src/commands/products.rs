//! Product management commands.
//!
//! # Usage
//!
//! ```bash
//! shoebox products list --search sneaker
//! shoebox products create --title Trainer --sku SH-100 --price 75 --size-6 10
//! shoebox products update 2 --price 119.99 --size-11 3
//! shoebox products delete 1
//! shoebox products upload-image ./hero.jpg --product 2
//! ```

use std::path::PathBuf;

use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use shoebox_admin::images::ImageUpload;
use shoebox_admin::listing::{PRODUCTS_PAGE_SIZE, Page, ProductFilter};
use shoebox_admin::{DataError, DataLayer};
use shoebox_core::{NewProduct, ProductId, ProductPatch, SizeRun, StockPatch};

use crate::output;

#[derive(Subcommand)]
pub enum ProductAction {
    /// List products, newest first
    List {
        /// Filter by title, SKU or category
        #[arg(short, long, default_value = "")]
        search: String,

        /// Page number
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Create a product
    Create(CreateProduct),
    /// Update fields of a product
    Update(UpdateProduct),
    /// Delete a product
    Delete { id: String },
    /// Upload an image, optionally attaching it to a product
    UploadImage {
        path: PathBuf,

        /// Product whose image URL should point at the upload
        #[arg(long)]
        product: Option<String>,
    },
}

/// Units per size. Sizes left out keep their current count on update and
/// start at zero on create.
#[derive(Args)]
pub struct StockArgs {
    #[arg(long = "size-6")]
    size_6: Option<u32>,
    #[arg(long = "size-7")]
    size_7: Option<u32>,
    #[arg(long = "size-8")]
    size_8: Option<u32>,
    #[arg(long = "size-9")]
    size_9: Option<u32>,
    #[arg(long = "size-10")]
    size_10: Option<u32>,
    #[arg(long = "size-11")]
    size_11: Option<u32>,
}

impl StockArgs {
    const fn patch(&self) -> StockPatch {
        StockPatch {
            size_6: self.size_6,
            size_7: self.size_7,
            size_8: self.size_8,
            size_9: self.size_9,
            size_10: self.size_10,
            size_11: self.size_11,
        }
    }

    fn initial(&self) -> SizeRun {
        let mut run = SizeRun::default();
        self.patch().apply_to(&mut run);
        run
    }
}

#[derive(Args)]
pub struct CreateProduct {
    #[arg(short, long)]
    title: String,
    #[arg(long)]
    sku: String,
    #[arg(long)]
    price: Decimal,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    image_url: Option<String>,
    #[arg(long, default_value = "")]
    category: String,
    #[arg(long, default_value = "")]
    colour: String,
    #[command(flatten)]
    stock: StockArgs,
}

#[derive(Args)]
pub struct UpdateProduct {
    id: String,
    #[arg(short, long)]
    title: Option<String>,
    #[arg(long)]
    sku: Option<String>,
    #[arg(long)]
    price: Option<Decimal>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    image_url: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    colour: Option<String>,
    #[command(flatten)]
    stock: StockArgs,
}

pub async fn run(layer: &DataLayer, action: ProductAction) -> Result<(), DataError> {
    let products = layer.products();
    match action {
        ProductAction::List { search, page } => {
            let matching = ProductFilter::new(&search).apply(products.list().await?);
            output::products(&Page::of(matching, page, PRODUCTS_PAGE_SIZE));
        }
        ProductAction::Create(args) => {
            let product = products
                .create(NewProduct {
                    title: args.title,
                    description: args.description,
                    image_url: args.image_url,
                    price: args.price,
                    sku: args.sku,
                    category: args.category,
                    colour: args.colour,
                    stock: args.stock.initial(),
                })
                .await?;
            output::product(&product);
        }
        ProductAction::Update(args) => {
            let id = ProductId::new(args.id);
            let patch = ProductPatch {
                title: args.title,
                description: args.description,
                image_url: args.image_url,
                price: args.price,
                sku: args.sku,
                category: args.category,
                colour: args.colour,
                stock: args.stock.patch(),
            };
            match products.update(&id, &patch).await? {
                Some(product) => output::product(&product),
                None => output::line(&format!("No product {id}")),
            }
        }
        ProductAction::Delete { id } => {
            let id = ProductId::new(id);
            products.delete(&id).await?;
            output::line(&format!("Deleted product {id}"));
        }
        ProductAction::UploadImage { path, product } => {
            let upload = ImageUpload::from_path(&path).await?;
            let url = match product {
                Some(id) => layer.set_product_image(&ProductId::new(id), upload).await?,
                None => layer.upload_image(upload).await?,
            };
            output::line(&url);
        }
    }
    Ok(())
}
