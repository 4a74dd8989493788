//! Print a bcrypt hash for the admin login.
//!
//! The password comes from the first argument, or ADMIN_PASSWORD when no
//! argument is given. The output line can be pasted into `.env`.

use bcrypt::{hash, verify, DEFAULT_COST};
use std::env;

fn main() {
    dotenvy::dotenv().ok();

    let password = env::args()
        .nth(1)
        .or_else(|| env::var("ADMIN_PASSWORD").ok())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| {
            eprintln!("Usage: cargo run --bin hash-password <PASSWORD>");
            eprintln!("   or: ADMIN_PASSWORD=<PASSWORD> cargo run --bin hash-password");
            std::process::exit(1);
        });

    if password.len() < 8 {
        eprintln!("Warning: passwords shorter than 8 characters are easy to guess");
    }

    let hashed = match hash(&password, DEFAULT_COST) {
        Ok(hashed) => hashed,
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            std::process::exit(1);
        }
    };

    if !verify(&password, &hashed).unwrap_or(false) {
        eprintln!("Error: generated hash does not verify");
        std::process::exit(1);
    }

    println!("\nCost : {}", DEFAULT_COST);
    println!("Hash : {}\n", hashed);
    println!("# Paste this into your .env:");
    println!("ADMIN_HASH_PASSWORD={}", hashed);
}
