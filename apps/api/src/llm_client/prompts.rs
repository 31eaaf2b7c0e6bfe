// Shared prompt constants.
// The synthesis pipeline defines its per-kind templates in synthesis/prompts.rs.
// This file contains the cross-cutting fragments every template relies on.

/// System prompt asking for labelled plain-text sections.
pub const SECTION_FORMAT_SYSTEM: &str = "You are a careful assistant supporting licensed \
    mental health professionals and their clients. \
    Respond in plain text using the section labels you are given, in the order given. \
    Put each label at the start of its own line, followed by a colon. \
    Write list sections as one item per line, each line starting with \"- \". \
    Do NOT wrap the response in code fences. \
    Do NOT add an introduction or closing remarks outside the sections.";

/// Safety instruction appended to every generation prompt.
pub const SAFETY_INSTRUCTION: &str = "\
    IMPORTANT: Use supportive, non-judgmental language. Do not diagnose, prescribe medication, \
    or promise outcomes. If the profile mentions risk of harm, keep the content gentle and \
    encourage reaching out to the client's therapist or local emergency services.";
