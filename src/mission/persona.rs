//! Persona templates for the three reasoning roles.
//!
//! Each role is a pair of templates, one for the instruction and one for the
//! context. Fields are written `{name}` and filled in a single pass, so text
//! substituted into a template is never expanded again.

use std::fmt;

/// The reasoning roles that share one inference capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Generator,
    Reflector,
    Curator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Generator => "generator",
            Self::Reflector => "reflector",
            Self::Curator => "curator",
        })
    }
}

/// A role's prompt templates.
#[derive(Debug, Clone, Copy)]
pub struct Persona {
    pub role: Role,
    instruction: &'static str,
    context: &'static str,
}

/// An instruction and its context, ready for inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub role: Role,
    pub instruction: String,
    pub context: String,
}

pub const GENERATOR: Persona = Persona {
    role: Role::Generator,
    instruction: "You are the Generator, a Junior Cyber Analyst. \
        Using the Playbook memory, plan a specific attack for: {objective}. \
        Output your reasoning and the specific command.",
    context: "CURRENT PLAYBOOK MEMORY:\n{playbook}\n\nOBJECTIVE: {objective}",
};

pub const REFLECTOR: Persona = Persona {
    role: Role::Reflector,
    instruction: "You are the Reflector. The Generator executed: '{action_plan}'. \
        The user reported the outcome: '{outcome}'. \
        Critique this. Why did it succeed or fail? What is the technical lesson?",
    context: "Post-Execution Analysis",
};

pub const CURATOR: Persona = Persona {
    role: Role::Curator,
    instruction: "You are the Curator. Distill the Reflector's insight: '{critique}' \
        into a single, concise 'Playbook Rule' (TOON format or brief text) \
        to prevent this error in future operations.",
    context: "Memory Optimization",
};

impl Persona {
    /// Fills both templates from `fields`.
    pub fn prompt(&self, fields: &[(&str, &str)]) -> Prompt {
        Prompt {
            role: self.role,
            instruction: fill(self.instruction, fields),
            context: fill(self.context, fields),
        }
    }
}

/// Generator prompt: plan an action for `objective` using current memory.
pub fn generator(playbook: &str, objective: &str) -> Prompt {
    GENERATOR.prompt(&[("playbook", playbook), ("objective", objective)])
}

/// Reflector prompt: critique `action_plan` given what happened.
pub fn reflector(action_plan: &str, outcome: &str) -> Prompt {
    REFLECTOR.prompt(&[("action_plan", action_plan), ("outcome", outcome)])
}

/// Curator prompt: distill `critique` into one rule.
pub fn curator(critique: &str) -> Prompt {
    CURATOR.prompt(&[("critique", critique)])
}

/// Replaces `{name}` fields in `template`. Unknown fields stay as written.
fn fill(template: &str, fields: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            fields
                .iter()
                .find(|(field, _)| *field == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_embeds_playbook_and_objective() {
        let prompt = generator("## Entry [x]\n- check firewall", "Enumerate open ports");

        assert_eq!(prompt.role, Role::Generator);
        assert_eq!(
            prompt.instruction,
            "You are the Generator, a Junior Cyber Analyst. Using the Playbook memory, \
             plan a specific attack for: Enumerate open ports. \
             Output your reasoning and the specific command."
        );
        assert_eq!(
            prompt.context,
            "CURRENT PLAYBOOK MEMORY:\n## Entry [x]\n- check firewall\n\nOBJECTIVE: Enumerate open ports"
        );
    }

    #[test]
    fn reflector_quotes_plan_and_outcome() {
        let prompt = reflector("Run port scan", "fail, scan blocked by firewall");

        assert!(
            prompt
                .instruction
                .contains("The Generator executed: 'Run port scan'.")
        );
        assert!(
            prompt
                .instruction
                .contains("The user reported the outcome: 'fail, scan blocked by firewall'.")
        );
        assert_eq!(prompt.context, "Post-Execution Analysis");
    }

    #[test]
    fn curator_quotes_critique() {
        let prompt = curator("The firewall dropped SYN probes.");

        assert!(
            prompt
                .instruction
                .starts_with("You are the Curator. Distill the Reflector's insight: 'The firewall dropped SYN probes.' into")
        );
        assert_eq!(prompt.context, "Memory Optimization");
    }

    #[test]
    fn substituted_text_is_not_expanded_again() {
        let prompt = generator("memory mentions {objective}", "scan {playbook}");

        assert_eq!(
            prompt.context,
            "CURRENT PLAYBOOK MEMORY:\nmemory mentions {objective}\n\nOBJECTIVE: scan {playbook}"
        );
    }

    #[test]
    fn unknown_and_unclosed_fields_are_kept() {
        assert_eq!(fill("{a} {b} {c", &[("a", "1")]), "1 {b} {c");
        assert_eq!(fill("{}", &[]), "{}");
    }
}
