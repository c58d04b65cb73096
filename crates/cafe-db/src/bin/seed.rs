//! # Seed Data Generator
//!
//! Populates the database with a demo café for development.
//!
//! ## Usage
//! ```bash
//! # Two weeks of order history (default)
//! cargo run -p cafe-db --bin seed
//!
//! # Longer history
//! cargo run -p cafe-db --bin seed -- --days 60
//!
//! # Specify database path
//! cargo run -p cafe-db --bin seed -- --db ./data/cafe.db
//! ```
//!
//! ## Generated Data
//! - Menu of coffee, tea and pastry items with recipes
//! - Ingredients with purchase costs
//! - Three staff members on morning / afternoon shifts every day
//! - A "Happy hour" 10% promotion covering the whole history
//! - Paid orders every day (some with the promotion), plus a few cancelled
//!
//! Everything is deterministic: the same `--days` gives the same data.

use chrono::{Duration, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::env;
use uuid::Uuid;

use cafe_core::{
    DiscountKind, EntityRef, Ingredient, Money, NewOrder, Order, OrderChannel, OrderLine,
    OrderStatus, PaymentMethod, Product, Promotion, Recipe, RecipeLine, Shift, StaffMember,
    WorkScheduleEntry,
};
use cafe_db::{Database, DbConfig};

/// (id, name, category, price)
const MENU: &[(&str, &str, &str, i64)] = &[
    ("ca-phe-sua", "Cà phê sữa đá", "Coffee", 29_000),
    ("bac-xiu", "Bạc xỉu", "Coffee", 32_000),
    ("americano", "Americano", "Coffee", 35_000),
    ("latte", "Latte", "Coffee", 45_000),
    ("tra-dao", "Trà đào cam sả", "Tea", 40_000),
    ("matcha", "Matcha latte", "Tea", 49_000),
    ("croissant", "Croissant", "Pastry", 30_000),
    ("banh-mi", "Bánh mì que", "Pastry", 15_000),
];

/// (id, name, unit, unit cost)
const INGREDIENTS: &[(&str, &str, &str, i64)] = &[
    ("robusta", "Robusta beans", "g", 350),
    ("arabica", "Arabica beans", "g", 600),
    ("condensed-milk", "Condensed milk", "ml", 90),
    ("fresh-milk", "Fresh milk", "ml", 40),
    ("peach-tea", "Peach tea base", "ml", 120),
    ("matcha-powder", "Matcha powder", "g", 1_500),
    ("croissant-dough", "Croissant dough", "pc", 11_000),
];

/// (product id, ingredient id, quantity as decimal mantissa, scale)
const RECIPES: &[(&str, &str, i64, u32)] = &[
    ("ca-phe-sua", "robusta", 20, 0),
    ("ca-phe-sua", "condensed-milk", 30, 0),
    ("bac-xiu", "robusta", 12, 0),
    ("bac-xiu", "condensed-milk", 25, 0),
    ("bac-xiu", "fresh-milk", 80, 0),
    ("americano", "arabica", 185, 1),
    ("latte", "arabica", 185, 1),
    ("latte", "fresh-milk", 180, 0),
    ("tra-dao", "peach-tea", 120, 0),
    ("matcha", "matcha-powder", 45, 1),
    ("matcha", "fresh-milk", 200, 0),
    ("croissant", "croissant-dough", 1, 0),
];

/// (id, name, hourly rate)
const STAFF: &[(&str, &str, i64)] = &[
    ("lan", "Lan", 25_000),
    ("minh", "Minh", 25_000),
    ("thu", "Thu", 30_000),
];

const PAYMENT_METHODS: &[PaymentMethod] = &[
    PaymentMethod::Cash,
    PaymentMethod::Card,
    PaymentMethod::EWallet,
    PaymentMethod::BankTransfer,
];

const PROMOTION_ID: &str = "happy-hour";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut days: i64 = 14;
    let mut db_path = String::from("./cafe_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--days" | "-n" => {
                if i + 1 < args.len() {
                    days = args[i + 1].parse().unwrap_or(14);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Café POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --days <N>     Days of order history (default: 14)");
                println!("  -d, --db <PATH>    Database file path (default: ./cafe_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Café POS Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!("History:  {} days", days);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.catalog().list_products(false).await?.len();
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let today = Utc::now().date_naive();
    let first_day = today - Duration::days(days.max(1) - 1);

    // Catalog
    let catalog = db.catalog();
    for (id, name, category, price) in MENU {
        catalog
            .insert_product(&Product {
                id: id.to_string(),
                name: name.to_string(),
                category: Some(category.to_string()),
                price: Money::from_minor(*price),
                is_active: true,
            })
            .await?;
    }
    for (id, name, unit, cost) in INGREDIENTS {
        catalog
            .insert_ingredient(&Ingredient {
                id: id.to_string(),
                name: name.to_string(),
                unit: unit.to_string(),
                unit_cost: Money::from_minor(*cost),
            })
            .await?;
    }
    for (product_id, _, _, _) in MENU {
        let lines: Vec<RecipeLine> = RECIPES
            .iter()
            .filter(|(p, _, _, _)| p == product_id)
            .map(|(_, ingredient, mantissa, scale)| RecipeLine {
                ingredient_id: ingredient.to_string(),
                quantity: Decimal::new(*mantissa, *scale),
            })
            .collect();
        if !lines.is_empty() {
            catalog
                .set_recipe(&Recipe {
                    product_id: product_id.to_string(),
                    lines,
                })
                .await?;
        }
    }
    println!("✓ {} products, {} ingredients", MENU.len(), INGREDIENTS.len());

    // Promotion covering the whole history
    let window_start = Utc.from_utc_datetime(&first_day.and_time(NaiveTime::default()));
    db.promotions()
        .insert(&Promotion {
            id: PROMOTION_ID.to_string(),
            name: "Happy hour 10%".to_string(),
            kind: DiscountKind::Percentage,
            value: 1000,
            starts_at: window_start,
            ends_at: window_start + Duration::days(days.max(1) + 30),
            is_active: true,
        })
        .await?;
    println!("✓ Promotion '{}'", PROMOTION_ID);

    // Staff and shifts
    let staff = db.staff();
    for (id, name, rate) in STAFF {
        staff
            .insert_member(&StaffMember {
                id: id.to_string(),
                name: name.to_string(),
                hourly_rate: Money::from_minor(*rate),
                is_active: true,
            })
            .await?;
    }
    let shifts = [
        ("morning", "Morning", 6, 14),
        ("afternoon", "Afternoon", 14, 22),
    ];
    for (id, name, start, end) in shifts {
        staff
            .insert_shift(&Shift {
                id: id.to_string(),
                name: name.to_string(),
                start_time: NaiveTime::from_hms_opt(start, 0, 0).unwrap_or_default(),
                end_time: NaiveTime::from_hms_opt(end, 0, 0).unwrap_or_default(),
            })
            .await?;
    }

    // Orders and schedule, day by day
    println!();
    println!("Generating history...");

    let start = std::time::Instant::now();
    let orders = db.orders();
    let mut paid = 0;
    let mut cancelled = 0;

    for day_offset in 0..days.max(1) {
        let day = first_day + Duration::days(day_offset);
        let seed = day_offset as usize;

        for (idx, (staff_id, _, _)) in STAFF.iter().enumerate() {
            let shift_id = shifts[(idx + seed) % shifts.len()].0;
            staff
                .schedule(&WorkScheduleEntry {
                    id: Uuid::new_v4().to_string(),
                    staff_id: staff_id.to_string(),
                    work_date: day,
                    shift_id: shift_id.to_string(),
                })
                .await?;
        }

        let orders_today = 12 + (seed * 7) % 9;
        for n in 0..orders_today {
            let hour = 7 + (n as u32 * 13 / orders_today as u32).min(13);
            let minute = ((n * 17 + seed * 5) % 60) as u32;
            let ordered_at = Utc.from_utc_datetime(
                &day.and_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()),
            );

            let (staff_id, staff_name, _) = STAFF[(n + seed) % STAFF.len()];
            let takeaway = n % 3 == 0;
            let mut order = Order::new(NewOrder {
                id: Uuid::new_v4().to_string(),
                order_number: String::new(),
                ordered_at,
                channel: if takeaway {
                    OrderChannel::Takeaway
                } else {
                    OrderChannel::DineIn
                },
                staff: Some(EntityRef::new(staff_id, staff_name)),
                customer: None,
                table: (!takeaway).then(|| {
                    let table = 1 + (n + seed) % 8;
                    EntityRef::new(format!("table-{}", table), format!("Table {}", table))
                }),
            });

            let line_count = 1 + (n + seed) % 3;
            for l in 0..line_count {
                let (product_id, name, _, price) = MENU[(n * 3 + l * 5 + seed) % MENU.len()];
                order.add_line(OrderLine {
                    id: Uuid::new_v4().to_string(),
                    product_id: product_id.to_string(),
                    name: name.to_string(),
                    quantity: 1 + ((n + l) % 2) as i64,
                    unit_price: Money::from_minor(price),
                })?;
            }

            if (14..=16).contains(&hour) {
                order.apply_promotion(Some(PROMOTION_ID.to_string()))?;
            }

            if (n + seed) % 11 == 10 {
                order.transition_to(OrderStatus::Cancelled, ordered_at)?;
                cancelled += 1;
            } else {
                let method = PAYMENT_METHODS[(n + seed) % PAYMENT_METHODS.len()];
                order.mark_paid(method, ordered_at + Duration::minutes(10))?;
                paid += 1;
            }

            orders.create(order).await?;
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!(
        "✓ Generated {} paid and {} cancelled orders in {:?}",
        paid, cancelled, elapsed
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
