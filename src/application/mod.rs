// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one command.
//
// Rules for this layer:
//   - No tensor math or model code here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination

// Load → balance → scale → split → train → evaluate → save
pub mod train_use_case;

// Reload a run and evaluate / score new tracks
pub mod evaluate_use_case;

// Per-class summary of an input file
pub mod inspect_use_case;
