//! Plain-text rendering of command results on stdout.

#![allow(clippy::print_stdout)]

use shoebox_admin::dashboard::DashboardStats;
use shoebox_admin::listing::Page;
use shoebox_core::{Product, User};

pub fn line(text: &str) {
    println!("{text}");
}

pub fn stats(stats: &DashboardStats) {
    println!("Users              {}", stats.total_users);
    println!("Loyalty points     {}", stats.total_points);
    println!("Products           {}", stats.total_products);
    println!("  in stock         {}", stats.products_in_stock);
    println!("  out of stock     {}", stats.products_out_of_stock);
    println!("Units on hand      {}", stats.total_units);
}

pub fn user(user: &User) {
    println!("{} ({})", user.name, user.id);
    println!("  role      {}", user.role);
    println!("  email     {}", dash(&user.email));
    println!("  phone     {}", dash(&user.phone1));
    if !user.phone2.is_empty() {
        println!("  phone 2   {}", user.phone2);
    }
    println!(
        "  location  {}",
        user.location().as_deref().unwrap_or("-")
    );
    println!("  points    {}", user.points);
    println!("  joined    {}", user.created_at.format("%Y-%m-%d"));
}

pub fn users(page: &Page<User>) {
    println!(
        "{:<10} {:<20} {:<26} {:<14} {:<22} {:>7}",
        "ID", "NAME", "EMAIL", "PHONE", "LOCATION", "POINTS"
    );
    for user in &page.items {
        println!(
            "{:<10} {:<20} {:<26} {:<14} {:<22} {:>7}",
            user.id.as_str(),
            user.name,
            dash(&user.email),
            dash(&user.phone1),
            user.location().unwrap_or_else(|| "-".to_string()),
            user.points
        );
    }
    footer(page);
}

pub fn product(product: &Product) {
    println!("{} ({})", product.title, product.id);
    println!("  sku       {}", product.sku);
    println!("  price     {}", product.price);
    println!("  category  {}", dash(&product.category));
    println!("  colour    {}", dash(&product.colour));
    if let Some(description) = &product.description {
        println!("  about     {description}");
    }
    if let Some(image_url) = &product.image_url {
        println!("  image     {image_url}");
    }
    println!("  stock     {}", stock_summary(product));
}

pub fn products(page: &Page<Product>) {
    println!(
        "{:<10} {:<24} {:<10} {:>9} {:>6}  {}",
        "ID", "TITLE", "SKU", "PRICE", "UNITS", "SIZES"
    );
    for product in &page.items {
        let sizes: Vec<String> = product
            .stock
            .available_sizes()
            .iter()
            .map(ToString::to_string)
            .collect();
        println!(
            "{:<10} {:<24} {:<10} {:>9} {:>6}  {}",
            product.id.as_str(),
            product.title,
            product.sku,
            product.price.round_dp(2),
            product.total_stock(),
            if sizes.is_empty() {
                "out of stock".to_string()
            } else {
                sizes.join(" ")
            }
        );
    }
    footer(page);
}

fn stock_summary(product: &Product) -> String {
    if !product.in_stock() {
        return "out of stock".to_string();
    }
    let per_size: Vec<String> = shoebox_core::Size::ALL
        .iter()
        .map(|&size| format!("{size}:{}", product.stock.get(size)))
        .collect();
    format!("{} units ({})", product.total_stock(), per_size.join(" "))
}

fn footer<T>(page: &Page<T>) {
    println!(
        "Page {} of {} ({} total)",
        page.number, page.total_pages, page.total_items
    );
}

fn dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}
