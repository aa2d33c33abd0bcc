//! Prompt templates for the workshop operations.
//!
//! Templates are written once in English. The per-language response
//! instruction at the end of every prompt selects the output language.

use crate::core::{
    BusinessIdea, IdeaBrief, Language, SketchStep, SketchStyle, StitchPromptOptions,
};

fn sketch_style_instruction(style: SketchStyle) -> &'static str {
    match style {
        SketchStyle::Simple => {
            "A CHILD-LIKE DRAWING style prompt for an image generation AI. The image should look \
             like a 5-8 year old child's drawing: very simple, wobbly lines, basic shapes, stick \
             figures with round heads and simple smiling faces, like a kindergarten drawing (NOT \
             skillful at all). Keep it under 15 words and use very basic descriptions like \
             \"child's drawing of leather bag\" or \"simple stick figure making wallet\"."
        }
        SketchStyle::Professional => {
            "A HAND-DRAWN SKETCH style prompt for an image generation AI. The image should look \
             like a professional hand-drawn sketch: clean lines, detailed shading, good \
             proportions and perspective. Use descriptive terms like \"professional sketch of \
             leather bag\" or \"detailed hand-drawn wallet illustration\"."
        }
    }
}

fn sketch_step_image_instruction(style: SketchStyle) -> &'static str {
    match style {
        SketchStyle::Simple => {
            "A CHILD-LIKE DRAWING style 'imagePrompt' for an image generation AI: very simple, \
             clumsy, wobbly lines, like a 5-8 year old child's drawing of the screen. Keep it \
             under 15 words."
        }
        SketchStyle::Professional => {
            "A HAND-DRAWN SKETCH style 'imagePrompt' for an image generation AI: a professional \
             illustration of the screen with clean lines and detailed shading. Keep it under 15 \
             words."
        }
    }
}

pub fn business_ideas(brief: &IdeaBrief, style: SketchStyle, lang: Language) -> String {
    format!(
        r"Based on the following user profile, generate 16 innovative business ideas. The ideas should be relevant to the user's skills, target customers, and their needs. If the user mentions specific keywords or themes (e.g., leather crafts, technology, food service), generate ideas related to those themes.

The output should follow a T-bar structure. For each idea, you must provide:
1. A snappy and clear title.
2. A detailed description with 4-6 bullet points explaining the business concept, target market, unique value proposition, potential challenges, and revenue model. Each bullet point MUST start with a bullet symbol (•) and be on a NEW LINE.
3. {style}

- User's skills and experience: {skills}
- Target customers: {target}
- Needs in the user's environment: {needs}

{instruction}",
        style = sketch_style_instruction(style),
        skills = brief.skills,
        target = brief.target,
        needs = brief.needs,
        instruction = lang.response_instruction(),
    )
}

pub fn three_step_sketches(idea: &BusinessIdea, style: SketchStyle, lang: Language) -> String {
    format!(
        r#"For the business idea "{title}: {description}", create 3 distinct variations of a 3-step user flow sketch. The flow should represent the key screens or interactions a user has with the product or service.

For each step in each of the 3 variations, provide:
1. A concise title for the screen or step.
2. A scenario-based 'description' with 3-4 bullet points on WHAT THE USER DOES and WHY, each on a new line.
3. {style}
4. A 'details' breakdown of the screen: layout, components, interactions, visuals, and tips.

The output must be a JSON array containing 3 arrays. Each inner array is one variation and contains exactly 3 step objects.

{instruction}"#,
        title = idea.title,
        description = idea.description,
        style = sketch_step_image_instruction(style),
        instruction = lang.response_instruction(),
    )
}

/// Default user-flow summary of a sketch variation.
pub fn flow_summary(steps: &[SketchStep]) -> String {
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            format!(
                "Step {}: {} - {}. Key components: {}",
                i + 1,
                step.title,
                step.details.layout,
                step.details.components.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn storyboard_pages(idea: &BusinessIdea, summary: &str, lang: Language) -> String {
    format!(
        r#"Based on the business idea "{title}: {description}" and the user flow: "{summary}", create 2 distinct variations of an 8-panel storyboard that visualizes the customer's journey.

For each of the 8 panels in each of the 2 variations, provide:
1. A short, descriptive title for the panel (max 5 words).
2. A 'description' with 3-5 bullet points (•) explaining the purpose, user experience, key features, or outcomes of the panel, each on a new line, with bold key phrases followed by descriptions.
3. A HAND-DRAWN SKETCH style 'imagePrompt' for an image generation AI: a quick pencil storyboard frame drawn during a workshop. Keep it under 10 words.

The output must be a JSON array containing 2 arrays. Each inner array is one 8-panel storyboard variation.

{instruction}"#,
        title = idea.title,
        description = idea.description,
        instruction = lang.response_instruction(),
    )
}

pub fn interview_questions(idea: &BusinessIdea, lang: Language) -> String {
    format!(
        r#"You are a senior UX researcher creating user interview questions for a new business idea.
The business idea is:
Title: "{title}"
Description: "{description}"

Generate 10 open-ended interview questions to validate this idea with potential users.
For each question, provide:
- A category (e.g., "Current situation assessment", "Problems and needs", "Solution validation").
- The question itself.
- A brief explanation of the intent behind the question.
- 2-3 potential follow-up questions.

{instruction}"#,
        title = idea.title,
        description = idea.description,
        instruction = lang.response_instruction(),
    )
}

pub fn stitch_prompt(options: &StitchPromptOptions, lang: Language) -> String {
    let pages: String = options
        .enabled_pages()
        .enumerate()
        .map(|(i, page)| {
            format!(
                "\n### Page {}\n- **Purpose**: {}\n- **Key Content/Features**: {}\n",
                i + 1,
                page.purpose,
                page.content
            )
        })
        .collect();
    let page_count = options.enabled_pages().count();
    let additional = if options.additional_requirements.trim().is_empty() {
        "None"
    } else {
        options.additional_requirements.as_str()
    };

    format!(
        r"Generate an optimized, comprehensive, and detailed prompt for a generative AI web design tool like Google Stitch. The goal is to create a complete website based on the user's specifications.

**1. Core Project Information:**
- **Problem Statement**: {problem}
- **Proposed Solution**: {solution}
- **Project Type**: {project_type}
- **Additional Requirements**: {additional}

**2. Design and Aesthetics:**
- **Target UI Language**: {ui_language}
- **Overall Design Style**: {design_style}
- **Color Palette**: {color_palette}
- **Typography/Font Style**: {typography}

**3. Structure and Layout:**
- **General Layout Principle**: {layout}
- **Required UI Components**: Create a cohesive design that includes the following components: {components}.

**4. Page-by-Page Breakdown:**
The website should consist of {page_count} pages with the following details:
{pages}

**Final Prompt Generation Instructions:**
Synthesize all the above information into a single, cohesive, and highly detailed prompt. Start with a high-level overview, then detail the styles, layout, components, and page structure so that an AI design tool can easily interpret and execute it.

{instruction}",
        problem = options.problem,
        solution = options.solution,
        project_type = options.project_type.as_str(),
        ui_language = options.ui_language,
        design_style = options.design_style,
        color_palette = options.color_palette,
        typography = options.typography,
        layout = options.layout,
        components = options.components.join(", "),
        instruction = lang.response_instruction(),
    )
}

fn analysis_instructions(lang: Language) -> String {
    format!(
        r#"Please analyze and provide the following:
1. **Summary**: A brief, high-level overview of the key findings.
2. **Key Patterns**: Identify recurring themes. For each pattern, provide a title, a short description, and count how many times it appeared.
3. **Key Insights**: What are the most important "aha" moments or deep understandings gained?
4. **Action Items**: Suggest concrete, prioritized actions. For each, assign a priority (High, Medium, or Low) and a relevant product category (e.g., UI, Feature, Marketing).

{}"#,
        lang.response_instruction()
    )
}

pub fn feedback_transcripts(transcripts: &[String], lang: Language) -> String {
    format!(
        "You are an expert UX researcher analyzing a collection of user interview transcripts. \
         Your task is to synthesize the feedback and extract meaningful patterns, insights, and \
         actionable recommendations.\n\nHere are the interview transcripts:\n---\n{}\n---\n{}",
        transcripts.join("\n---\n"),
        analysis_instructions(lang)
    )
}

pub fn feedback_audio(lang: Language) -> String {
    format!(
        "You are an expert UX researcher analyzing a collection of user interview audio \
         recordings. Your task is to listen to the recordings, synthesize the feedback, and \
         extract meaningful patterns, insights, and actionable recommendations.\nThe following \
         parts are the audio recordings. {}",
        analysis_instructions(lang)
    )
}
