pub mod chime;

use std::sync::Arc;

pub use chime::TwoToneChime;

/// Audible cue played when a new notification arrives.
pub trait SoundCue: Send + Sync {
    /// Starts the cue and returns immediately.
    fn play(&self);
}

/// Cue for builds or hosts without audio output.
pub struct SilentCue;

impl SoundCue for SilentCue {
    fn play(&self) {
        log::debug!("Chime skipped: audio output not available");
    }
}

/// Default cue for this build.
pub fn default_sound_cue() -> Arc<dyn SoundCue> {
    #[cfg(feature = "audio")]
    {
        Arc::new(player::ChimePlayer::new())
    }

    #[cfg(not(feature = "audio"))]
    {
        Arc::new(SilentCue)
    }
}

#[cfg(feature = "audio")]
pub use player::ChimePlayer;

#[cfg(feature = "audio")]
mod player {
    use rodio::{OutputStream, Sink};
    use std::sync::{
        mpsc::{self, Sender},
        Mutex,
    };
    use std::thread;

    use super::{SoundCue, TwoToneChime};

    const ENABLE_LOGS: bool = true;
    const LOG_SCOPE: &str = "audio";

    use crate::{log_error, log_warn};

    enum AudioCommand {
        PlayChime,
        Shutdown,
    }

    /// Plays the chime on a dedicated thread that owns the non-`Send`
    /// output stream. The stream is opened lazily on the first chime.
    pub struct ChimePlayer {
        tx: Mutex<Option<Sender<AudioCommand>>>,
    }

    impl ChimePlayer {
        pub fn new() -> Self {
            Self {
                tx: Mutex::new(None),
            }
        }

        fn ensure_thread(&self) -> Result<Sender<AudioCommand>, String> {
            let mut guard = self.tx.lock().map_err(|e| e.to_string())?;
            if let Some(tx) = guard.as_ref() {
                return Ok(tx.clone());
            }

            let (tx, rx) = mpsc::channel::<AudioCommand>();

            thread::Builder::new()
                .name("audio-chime".to_string())
                .spawn(move || {
                    let mut _stream: Option<OutputStream> = None;
                    let mut sink: Option<Sink> = None;

                    fn ensure_sink(
                        stream: &mut Option<OutputStream>,
                        sink: &mut Option<Sink>,
                    ) -> Result<(), String> {
                        if sink.is_none() {
                            let (s, handle) = OutputStream::try_default()
                                .map_err(|e| format!("Failed to create audio output stream: {}", e))?;
                            let new_sink = Sink::try_new(&handle)
                                .map_err(|e| format!("Failed to create audio sink: {}", e))?;
                            *stream = Some(s);
                            *sink = Some(new_sink);
                        }
                        Ok(())
                    }

                    while let Ok(cmd) = rx.recv() {
                        match cmd {
                            AudioCommand::PlayChime => {
                                if let Err(err) = ensure_sink(&mut _stream, &mut sink) {
                                    log_warn!("{err}");
                                    continue;
                                }
                                if let Some(ref s) = sink {
                                    s.append(TwoToneChime::new());
                                }
                            }
                            AudioCommand::Shutdown => break,
                        }
                    }
                })
                .map_err(|e| e.to_string())?;

            *guard = Some(tx.clone());
            Ok(tx)
        }
    }

    impl Default for ChimePlayer {
        fn default() -> Self {
            Self::new()
        }
    }

    impl SoundCue for ChimePlayer {
        fn play(&self) {
            let result = self
                .ensure_thread()
                .and_then(|tx| tx.send(AudioCommand::PlayChime).map_err(|e| e.to_string()));
            if let Err(err) = result {
                log_error!("Could not play notification chime: {err}");
            }
        }
    }

    impl Drop for ChimePlayer {
        fn drop(&mut self) {
            if let Ok(Some(tx)) = self.tx.lock().map(|mut guard| guard.take()) {
                let _ = tx.send(AudioCommand::Shutdown);
            }
        }
    }
}
