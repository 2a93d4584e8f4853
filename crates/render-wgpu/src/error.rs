use vigil_scene::MeshError;

/// Fatal errors while bringing up the GPU and building pipelines.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("shader `{label}` failed to compile:\n{log}")]
    ShaderCompile { label: String, log: String },
    #[error("program `{program}` has no uniform `{name}`")]
    MissingUniform { program: String, name: String },
    #[error("program `{program}` has no vertex attribute `{name}`")]
    MissingAttribute { program: String, name: String },
    #[error(transparent)]
    Mesh(#[from] MeshError),
}
