// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (training, recognising, inspecting).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination; errors gain anyhow context
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow
pub mod train_use_case;

// Recognise one recorded gesture
pub mod predict_use_case;

// Read a checkpoint's metadata
pub mod inspect_use_case;

/// Compute device, chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceKind {
    /// GPU through WGPU (Vulkan / Metal / DX12)
    #[default]
    Wgpu,
    /// Pure-Rust NdArray backend on the CPU
    Cpu,
}
