// Prompt templates for the synthesis pipeline, one per generation kind.
// Placeholders in braces are filled by prompt_builder.rs. Section labels must stay
// in step with the rule tables in fields.rs.

pub const NARRATIVE_TEMPLATE: &str = "\
Write a {subtype} for the client described below. It should be between 300 and 800 words, \
use second person where it suits the form, and speak to the client's challenges and goals \
without naming them clinically.

CLIENT PROFILE:
{profile_summary}

Respond with exactly these sections:
Title: <a short title on one line>
Content:
<the full {subtype}>
Themes:
- <theme>
Target Challenges:
- <challenge this piece addresses>
Mood Context: <one or two sentences on how the piece meets the client's current mood>
Personalization Notes:
- <how the piece was tailored to this client>

{safety}";

pub const ROLE_PLAY_TEMPLATE: &str = "\
Design a role-play scenario in which the client rehearses {scenario_type}. \
The difficulty level is {difficulty}: at beginner level the other person is receptive, \
at advanced level they push back realistically.

CLIENT PROFILE:
{profile_summary}

Respond with exactly these sections:
Title: <scenario title on one line>
Description: <two or three sentences>
Context: <where and when the conversation happens>
Objective: <what the client is practising>
AI Role: <who the AI plays, on one line>
AI Personality: <how that person behaves>
Opening Line: <the first thing the AI says>
Adaptation Rules:
- <how the AI adjusts to the client's responses>
User Guidance:
- <tip for the client>
Success Metrics:
- <observable sign the practice went well>

{safety}";

pub const CLINICAL_SYNTHESIS_TEMPLATE: &str = "\
Prepare a clinical synthesis for the therapist from the client profile, mood history \
and session notes below. Be concise and factual; only report patterns the material supports.

CLIENT PROFILE:
{profile_summary}

SESSION NOTES:
{session_notes}

Respond with exactly these sections:
Key Themes:
- <theme>
Emotional Patterns:
- <pattern>
Coping Strategies:
- <strategy the client uses or could use>
Progress Indicators:
- <indicator>
Concern Areas:
- <concern>
Suggested Topics:
- <topic for the next session>
Mood Pattern: <one of: improving, stable, declining, fluctuating>
Mood Analysis: <two or three sentences on the mood history>
Mood Recommendations:
- <recommendation>
Next Session Focus:
- <focus>
Summary: <a short paragraph>

{safety}";

pub const HOMEWORK_TEMPLATE: &str = "\
Create a {duration_days}-day {homework_type} homework plan at {difficulty} level for \
the client described below. Each day has one practice that fits in a normal day.

CLIENT PROFILE:
{profile_summary}

Respond with exactly these sections:
Title: <plan title on one line>
Description: <two or three sentences>

Then one block per day, from Day 1 to Day {duration_days}, each in this form:
Day 1:
Title: <task title>
Instructions: <what to do>
Duration: <minutes, as a number>
Materials:
- <item, or leave empty if none>
Reflection Prompts:
- <question>

Then:
Objectives:
- <objective>
Personalization Notes:
- <how the plan was tailored>
Progress Tracking:
- <how the client tracks progress>

{safety}";

pub const CONTENT_ASSET_TEMPLATE: &str = "\
Write a {asset_type} about \"{topic}\" for a mental health practice. Aim for about \
{word_count_target} words in a {tone} tone. The reader is a member of the public, not a clinician.

Respond with exactly these sections:
Title: <headline on one line>
Category: <one short category>
Content:
<the full {asset_type}>
Target Audience:
- <audience>
Techniques:
- <therapeutic technique referenced>
Call to Action: <one or two sentences>
Tags: <comma separated tags>

{safety}";
