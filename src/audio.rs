//! Audio cue mixing
//!
//! Tracks the three volume buses, a small pool of sound effect voices and
//! the music track with its crossfade. Actual sound output goes through an
//! [`AudioBackend`]; the default backend only logs what would play.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::settings::Settings;
use crate::sim::GameEvent;

/// Number of simultaneous sound effect voices
pub const DEFAULT_SFX_VOICES: usize = 6;

/// Random pitch range applied to every effect
pub const PITCH_MIN: f32 = 0.98;
pub const PITCH_MAX: f32 = 1.02;

/// Default music crossfade, in seconds
pub const MUSIC_FADE: f32 = 0.35;

/// Convert a linear 0..1 volume to decibels (0 maps to -80 dB)
pub fn linear_to_db(v: f32) -> f32 {
    v.max(1e-4).log10() * 20.0
}

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// Ball redirected (also used for stars, quieter)
    Hit,
    /// Teleporter entry or exit
    Teleport,
    /// Endpoint reached
    Goal,
    /// Ball lost
    Fail,
    /// A menu or command action was confirmed
    UiClick,
    /// Pointer moved over a control; only a pointer-driven front end plays it
    UiHover,
}

impl SoundCue {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundCue::Hit => "hit",
            SoundCue::Teleport => "teleport",
            SoundCue::Goal => "goal",
            SoundCue::Fail => "fail",
            SoundCue::UiClick => "ui_click",
            SoundCue::UiHover => "ui_hover",
        }
    }

    /// How long a voice stays busy with this cue
    pub fn length(&self) -> f32 {
        match self {
            SoundCue::Hit => 0.15,
            SoundCue::Teleport => 0.4,
            SoundCue::Goal => 1.2,
            SoundCue::Fail => 0.8,
            SoundCue::UiClick => 0.08,
            SoundCue::UiHover => 0.05,
        }
    }
}

/// Sound (and per-shot volume) for a simulation event
pub fn cue_for_event(event: &GameEvent) -> Option<(SoundCue, f32)> {
    match event {
        GameEvent::Hit { .. } => Some((SoundCue::Hit, 1.0)),
        GameEvent::StarCollected { .. } => Some((SoundCue::Hit, 0.7)),
        GameEvent::TeleportEnter { .. } | GameEvent::TeleportExit { .. } => {
            Some((SoundCue::Teleport, 1.0))
        }
        GameEvent::Goal { .. } => Some((SoundCue::Goal, 1.0)),
        GameEvent::Fail { .. } => Some((SoundCue::Fail, 1.0)),
        _ => None,
    }
}

/// Mixer bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bus {
    Master,
    Music,
    Sfx,
}

/// Where sounds actually go
pub trait AudioBackend {
    /// Set a bus gain in decibels
    fn set_bus_volume(&mut self, bus: Bus, db: f32);
    /// Start a one-shot effect on a voice
    fn play_one_shot(&mut self, voice: usize, cue: SoundCue, volume: f32, pitch: f32);
    /// Change the music clip or its fade volume; None stops the music
    fn set_music(&mut self, clip: Option<&str>, looping: bool, volume: f32);
}

/// Backend that only logs
#[derive(Debug, Default)]
pub struct LogBackend;

impl AudioBackend for LogBackend {
    fn set_bus_volume(&mut self, bus: Bus, db: f32) {
        log::debug!("{bus:?} bus at {db:.1} dB");
    }

    fn play_one_shot(&mut self, voice: usize, cue: SoundCue, volume: f32, pitch: f32) {
        log::debug!(
            "sfx {} on voice {voice} (vol {volume:.2}, pitch {pitch:.3})",
            cue.as_str()
        );
    }

    fn set_music(&mut self, clip: Option<&str>, looping: bool, volume: f32) {
        log::trace!("music {clip:?} loop={looping} vol={volume:.2}");
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Voice {
    cue: Option<SoundCue>,
    remaining: f32,
}

impl Voice {
    fn is_playing(&self) -> bool {
        self.remaining > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Fade {
    Idle,
    Out { t: f32, from: f32 },
    In { t: f32 },
}

/// Music track with fade-out / fade-in when the clip changes
#[derive(Debug, Clone)]
pub struct MusicPlayer {
    clip: Option<String>,
    looping: bool,
    volume: f32,
    fade_secs: f32,
    fade: Fade,
    next: Option<(Option<String>, bool)>,
}

impl Default for MusicPlayer {
    fn default() -> Self {
        Self {
            clip: None,
            looping: true,
            volume: 1.0,
            fade_secs: MUSIC_FADE,
            fade: Fade::Idle,
            next: None,
        }
    }
}

impl MusicPlayer {
    pub fn clip(&self) -> Option<&str> {
        self.clip.as_deref()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_fading(&self) -> bool {
        self.fade != Fade::Idle
    }

    /// Queue a clip change. Returns false if that clip is already playing.
    pub fn play(&mut self, clip: Option<&str>, looping: bool, fade: f32) -> bool {
        if self.next.is_none() && self.clip.is_some() && self.clip.as_deref() == clip {
            return false;
        }
        self.next = Some((clip.map(str::to_string), looping));
        self.fade_secs = fade.max(0.0);
        self.fade = Fade::Out {
            t: 0.0,
            from: self.volume,
        };
        true
    }

    /// Advance the fade. Returns true when the backend needs updating.
    fn update(&mut self, dt: f32) -> bool {
        match self.fade {
            Fade::Idle => false,
            Fade::Out { t, from } => {
                let t = t + dt;
                if t >= self.fade_secs {
                    self.volume = 0.0;
                    if let Some((clip, looping)) = self.next.take() {
                        self.clip = clip;
                        self.looping = looping;
                    }
                    self.fade = Fade::In { t: 0.0 };
                } else {
                    self.volume = from + (0.0 - from) * (t / self.fade_secs);
                    self.fade = Fade::Out { t, from };
                }
                true
            }
            Fade::In { t } => {
                let t = t + dt;
                if t >= self.fade_secs {
                    self.volume = 1.0;
                    self.fade = Fade::Idle;
                } else {
                    self.volume = t / self.fade_secs;
                    self.fade = Fade::In { t };
                }
                true
            }
        }
    }
}

/// Volumes, voices and music for one game session
pub struct AudioManager<B: AudioBackend = LogBackend> {
    backend: B,
    master: f32,
    music: f32,
    sfx: f32,
    voices: Vec<Voice>,
    music_player: MusicPlayer,
    rng: Pcg32,
}

impl AudioManager<LogBackend> {
    /// Logging-only manager configured from settings
    pub fn from_settings(settings: &Settings, seed: u64) -> Self {
        let mut audio = Self::new(LogBackend, seed);
        audio.apply_settings(settings);
        audio
    }
}

impl<B: AudioBackend> AudioManager<B> {
    pub fn new(backend: B, seed: u64) -> Self {
        Self::with_voices(backend, seed, DEFAULT_SFX_VOICES)
    }

    pub fn with_voices(backend: B, seed: u64, voices: usize) -> Self {
        let mut audio = Self {
            backend,
            master: 0.8,
            music: 0.8,
            sfx: 1.0,
            voices: vec![Voice::default(); voices.max(1)],
            music_player: MusicPlayer::default(),
            rng: Pcg32::seed_from_u64(seed),
        };
        audio.apply_volumes();
        audio
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn master(&self) -> f32 {
        self.master
    }

    pub fn music(&self) -> f32 {
        self.music
    }

    pub fn sfx(&self) -> f32 {
        self.sfx
    }

    pub fn set_master(&mut self, v: f32) {
        self.master = v.clamp(0.0, 1.0);
        self.apply_volumes();
    }

    pub fn set_music(&mut self, v: f32) {
        self.music = v.clamp(0.0, 1.0);
        self.apply_volumes();
    }

    pub fn set_sfx(&mut self, v: f32) {
        self.sfx = v.clamp(0.0, 1.0);
        self.apply_volumes();
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.master = settings.master_volume.clamp(0.0, 1.0);
        self.music = settings.music_volume.clamp(0.0, 1.0);
        self.sfx = settings.sfx_volume.clamp(0.0, 1.0);
        self.apply_volumes();
    }

    fn apply_volumes(&mut self) {
        self.backend.set_bus_volume(Bus::Master, linear_to_db(self.master));
        self.backend.set_bus_volume(Bus::Music, linear_to_db(self.music));
        self.backend.set_bus_volume(Bus::Sfx, linear_to_db(self.sfx));
    }

    /// Play an effect on the first free voice, or steal voice 0 when all
    /// are busy. Returns the voice used.
    pub fn play_sfx(&mut self, cue: SoundCue, volume: f32) -> usize {
        let index = self
            .voices
            .iter()
            .position(|v| !v.is_playing())
            .unwrap_or(0);
        let pitch = self.rng.random_range(PITCH_MIN..PITCH_MAX);
        self.voices[index] = Voice {
            cue: Some(cue),
            remaining: cue.length() / pitch,
        };
        self.backend.play_one_shot(index, cue, volume, pitch);
        index
    }

    /// Play whatever sound an event calls for
    pub fn handle_event(&mut self, event: &GameEvent) {
        if let Some((cue, volume)) = cue_for_event(event) {
            self.play_sfx(cue, volume);
        }
    }

    /// Voices still playing
    pub fn busy_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_playing()).count()
    }

    /// Cue on a voice, if it is playing
    pub fn voice_cue(&self, index: usize) -> Option<SoundCue> {
        self.voices
            .get(index)
            .filter(|v| v.is_playing())
            .and_then(|v| v.cue)
    }

    /// Switch music with the default crossfade
    pub fn play_music(&mut self, clip: Option<&str>, looping: bool) -> bool {
        self.play_music_fade(clip, looping, MUSIC_FADE)
    }

    pub fn play_music_fade(&mut self, clip: Option<&str>, looping: bool, fade: f32) -> bool {
        let started = self.music_player.play(clip, looping, fade);
        if started && fade <= 0.0 {
            self.update(0.0);
        }
        started
    }

    pub fn music_player(&self) -> &MusicPlayer {
        &self.music_player
    }

    /// Advance voice timers and the music fade
    pub fn update(&mut self, dt: f32) {
        for voice in &mut self.voices {
            voice.remaining = (voice.remaining - dt).max(0.0);
        }
        if self.music_player.update(dt) {
            let player = &self.music_player;
            self.backend
                .set_music(player.clip.as_deref(), player.looping, player.volume);
        }
    }
}
