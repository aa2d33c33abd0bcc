//! Response schemas for structured generation.

use serde_json::{json, Value};

fn string_array() -> Value {
    json!({ "type": "ARRAY", "items": { "type": "STRING" } })
}

pub fn business_ideas() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "ideas": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "sketchPrompt": {
                            "type": "STRING",
                            "description": "A short drawing prompt for a text-to-image model."
                        }
                    },
                    "required": ["title", "description", "sketchPrompt"]
                }
            }
        },
        "required": ["ideas"]
    })
}

pub fn sketch_variations() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "title": {
                        "type": "STRING",
                        "description": "Title of the step (e.g., Landing Page, Product Details)"
                    },
                    "description": {
                        "type": "STRING",
                        "description": "3-4 bullet points on what the user does and why, separated by newlines."
                    },
                    "imagePrompt": {
                        "type": "STRING",
                        "description": "A prompt for an image model to visualize this screen."
                    },
                    "details": {
                        "type": "OBJECT",
                        "properties": {
                            "layout": { "type": "STRING" },
                            "components": string_array(),
                            "interactions": { "type": "STRING" },
                            "visuals": { "type": "STRING" },
                            "tips": { "type": "STRING" }
                        }
                    }
                },
                "required": ["title", "description", "imagePrompt"]
            }
        }
    })
}

pub fn storyboard_variations() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "title": { "type": "STRING" },
                    "description": { "type": "STRING" },
                    "imagePrompt": { "type": "STRING" }
                },
                "required": ["title", "description", "imagePrompt"]
            }
        }
    })
}

pub fn interview_questions() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "questions": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "category": { "type": "STRING" },
                        "question": { "type": "STRING" },
                        "intent": { "type": "STRING" },
                        "followUp": string_array()
                    },
                    "required": ["category", "question", "intent", "followUp"]
                }
            }
        },
        "required": ["questions"]
    })
}

pub fn stitch_prompt() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING", "description": "A concise title for the project." },
            "description": { "type": "STRING", "description": "A short description of the project." },
            "optimizedPrompt": {
                "type": "STRING",
                "description": "The final, optimized prompt for the design tool."
            }
        },
        "required": ["title", "description", "optimizedPrompt"]
    })
}

pub fn feedback_analysis() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": { "type": "STRING" },
            "keyPatterns": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "pattern": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "count": { "type": "NUMBER" }
                    },
                    "required": ["pattern", "description", "count"]
                }
            },
            "insights": string_array(),
            "actionItems": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "priority": { "type": "STRING", "enum": ["High", "Medium", "Low"] },
                        "item": { "type": "STRING" },
                        "category": { "type": "STRING" }
                    },
                    "required": ["priority", "item", "category"]
                }
            }
        },
        "required": ["summary", "keyPatterns", "insights", "actionItems"]
    })
}
