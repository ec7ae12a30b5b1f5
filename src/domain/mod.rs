// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing tracks and
// their physics origin.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits

// A reconstructed track as read from the event store
pub mod track;

// Ground-truth origin classes and the label mapping
pub mod origin;

// Core abstractions (traits) that other layers implement
pub mod traits;
