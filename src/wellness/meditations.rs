//! Guided meditation catalog with synthesized narration
//!
//! Scripts are narrated line by line through the speech endpoint; the
//! sensory grounding steps are a second static catalog used by the
//! 5-4-3-2-1 exercise.

use crate::client::{ModelClient, RetryPolicy};
use crate::live::frames::pcm16_to_f32;
use crate::{Result, SolaceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Relaxation,
    Focus,
    Sleep,
}

#[derive(Debug, Clone)]
pub struct Meditation {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub duration_min: u8,
    pub category: Category,
    pub script: &'static [&'static str],
}

pub const CATALOG: &[Meditation] = &[
    Meditation {
        id: "m1",
        title: "Deep Ocean Relaxation",
        description: "A calming descent beneath quiet water to release tension.",
        duration_min: 5,
        category: Category::Relaxation,
        script: &[
            "Find a comfortable position and gently close your eyes.",
            "Breathe in slowly, and as you breathe out, picture yourself floating on a calm blue sea.",
            "Sink softly beneath the surface, where the noise of the day fades away.",
            "With every breath you drift deeper, weightless and safe.",
            "Rest here a while, simply breathing.",
            "When you are ready, return your awareness to the room and open your eyes.",
        ],
    },
    Meditation {
        id: "m2",
        title: "Steady Mountain Focus",
        description: "A visualization of a mountain peak to sharpen attention.",
        duration_min: 3,
        category: Category::Focus,
        script: &[
            "Sit upright and feel the ground beneath you, strong and steady.",
            "Imagine you are a mountain, rooted deep in the earth, your peak in clear sky.",
            "Thoughts pass like clouds. Watch them drift by without holding on.",
            "Breathe in clarity. Breathe out distraction.",
            "Carry this steadiness with you as you return.",
        ],
    },
    Meditation {
        id: "m3",
        title: "Starlight Sleep Drift",
        description: "A soothing night-sky visualization for drifting into rest.",
        duration_min: 7,
        category: Category::Sleep,
        script: &[
            "Lie down comfortably and let your body sink into the bed.",
            "Picture the ceiling opening to a vast night sky full of quiet stars.",
            "Choose one star and rest your attention on its gentle light.",
            "Your limbs grow heavy. The night is still.",
            "Let each thought slip away like a shooting star.",
            "Rest now. The stars are watching over you.",
        ],
    },
];

#[derive(Debug, Clone)]
pub struct GroundingStep {
    pub title: &'static str,
    pub prompt: &'static str,
}

pub const GROUNDING_STEPS: &[GroundingStep] = &[
    GroundingStep {
        title: "5 THINGS YOU SEE",
        prompt: "Acknowledge 5 things you see around you. Maybe a bird, a clock, or a spot on the wall.",
    },
    GroundingStep {
        title: "4 THINGS YOU FEEL",
        prompt: "Acknowledge 4 things you can touch. Your hair, a chair, or the ground under your feet.",
    },
    GroundingStep {
        title: "3 THINGS YOU HEAR",
        prompt: "Acknowledge 3 things you hear. Traffic, a fan, or your own breath.",
    },
    GroundingStep {
        title: "2 THINGS YOU SMELL",
        prompt: "Acknowledge 2 things you can smell. Coffee, fresh air, or even your own shirt.",
    },
    GroundingStep {
        title: "1 THING YOU TASTE",
        prompt: "Acknowledge 1 thing you can taste. Mint, your last meal, or just the inside of your mouth.",
    },
];

pub fn find(id: &str) -> Option<&'static Meditation> {
    CATALOG.iter().find(|m| m.id == id)
}

fn narration_prompt(line: &str) -> String {
    format!(
        "Read this meditation script with a very calm, soothing, and slow voice: {}",
        line
    )
}

/// Synthesize one script line; returns mono playback samples
pub fn narrate(
    model: &dyn ModelClient,
    retry: &RetryPolicy,
    line: &str,
) -> Result<Vec<f32>> {
    if line.trim().is_empty() {
        return Err(SolaceError::ValidationError(
            "script line is empty".to_string(),
        ));
    }

    let pcm = retry.run(|| model.generate_speech(&narration_prompt(line)))?;
    Ok(pcm16_to_f32(&pcm))
}
