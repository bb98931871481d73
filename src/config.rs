use clap::ValueEnum;
use ort::execution_providers as ep;
use ort::execution_providers::ExecutionProviderDispatch;

/// Compute device for model inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Device {
    /// Prefer CUDA, fall back to CPU when unavailable
    Auto,
    Cpu,
    Cuda,
}

impl Device {
    /// Execution providers to register with an ONNX Runtime session, in
    /// preference order. A provider that fails to initialize is skipped and
    /// the session falls through to the next one.
    pub fn execution_providers(self) -> Vec<ExecutionProviderDispatch> {
        match self {
            Device::Cpu => vec![ep::CPUExecutionProvider::default().build()],
            Device::Cuda => vec![ep::CUDAExecutionProvider::default().build()],
            Device::Auto => vec![
                ep::CUDAExecutionProvider::default().build(),
                ep::CPUExecutionProvider::default().build(),
            ],
        }
    }
}

/// Configuration for one invocation. Built at startup from the CLI and never
/// mutated mid-run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Free-text category names the detector is prompted with
    pub categories: Vec<String>,
    /// Minimum detection confidence in [0, 1]
    pub confidence_threshold: f32,
    /// IoU threshold for non-max suppression in [0, 1]
    pub iou_threshold: f32,
    /// Suppress across classes rather than per class
    pub class_agnostic_nms: bool,
    pub device: Device,
    /// Foreground blend weight for image composites; 1.0 is a hard cut
    pub background_alpha: f32,
}
