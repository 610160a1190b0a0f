// play_billing_gdext — GDExtension bridge between the billing core and Godot.
//
// This crate is a thin wrapper that exposes `play_billing` to Godot 4 via
// gdext (godot-rust). It contains no billing logic — only translation
// between Godot types and billing types.
//
// Godot calls into this crate to:
// - Open and close the billing service connection.
// - Query product details and current purchases.
// - Launch purchase and subscription-update flows.
// - Acknowledge and consume purchases.
// - Receive billing outcomes as signals, one frame-drain at a time.
//
// Module overview:
// - `billing.rs`:  The `GooglePlayBilling` Godot node — sole interface
//                  between GDScript and Rust. Commands return a verdict
//                  dictionary; outcomes arrive later as signals. Public so
//                  a platform binding can reach `install_client`.
// - `variant.rs`:  JSON-to-Variant conversion that preserves dictionary
//                  key order across the boundary.
//
// See also: `play_billing` for all billing logic and the event channel the
// node drains each frame.

pub mod billing;
mod variant;

use godot::prelude::*;

struct PlayBillingExtension;

#[gdextension]
unsafe impl ExtensionLibrary for PlayBillingExtension {}
