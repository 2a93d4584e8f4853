use crate::source::AmbientSource;
use crate::{AudioError, AudioSettings};
use rodio::{OutputStream, OutputStreamBuilder};

/// Output device that can play the ambient mix.
pub trait AudioBackend {
    fn play(&mut self, source: AmbientSource) -> Result<(), AudioError>;
}

/// Default system output through `rodio`.
pub struct RodioBackend {
    stream: OutputStream,
}

impl RodioBackend {
    pub fn open() -> Result<Self, AudioError> {
        let stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| AudioError::Device(e.to_string()))?;
        Ok(Self { stream })
    }
}

impl AudioBackend for RodioBackend {
    fn play(&mut self, source: AmbientSource) -> Result<(), AudioError> {
        self.stream.mixer().add(source);
        Ok(())
    }
}

/// Lifecycle of the gesture-gated audio graph. There is no stop path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Waiting for the first user gesture.
    Idle,
    Running,
    Muted,
    /// The device could not be opened; the scene carries on silently.
    Failed,
}

/// Starts audio on the first user gesture and ignores every later one.
pub struct AudioGate {
    settings: AudioSettings,
    state: GateState,
    // Dropping the backend closes the output stream.
    _output: Option<Box<dyn AudioBackend>>,
}

impl AudioGate {
    pub fn new(settings: AudioSettings) -> Self {
        let state = if settings.muted {
            GateState::Muted
        } else {
            GateState::Idle
        };
        Self {
            settings,
            state,
            _output: None,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Handle a gesture by opening the default output device.
    pub fn on_gesture(&mut self) -> GateState {
        self.on_gesture_with(|| {
            let backend: Box<dyn AudioBackend> = Box::new(RodioBackend::open()?);
            Ok(backend)
        })
    }

    /// Handle a gesture with a caller-supplied device. `open` is only called
    /// while the gate is idle.
    pub fn on_gesture_with<F>(&mut self, open: F) -> GateState
    where
        F: FnOnce() -> Result<Box<dyn AudioBackend>, AudioError>,
    {
        if self.state != GateState::Idle {
            return self.state;
        }
        let started = open().and_then(|mut backend| {
            backend.play(AmbientSource::new(&self.settings)?)?;
            Ok(backend)
        });
        match started {
            Ok(backend) => {
                tracing::info!(
                    sample_rate = self.settings.sample_rate,
                    gain = self.settings.master_gain,
                    "ambient audio started"
                );
                self._output = Some(backend);
                self.state = GateState::Running;
            }
            Err(err) => {
                tracing::warn!(%err, "ambient audio unavailable, continuing without sound");
                self.state = GateState::Failed;
            }
        }
        self.state
    }
}
