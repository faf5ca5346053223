//! Request assembly for the chat relay.

use crate::knowledge::KnowledgeBase;
use avatalk_types::{Part, Role, Turn};

/// Persona instruction prepended to every user turn.
pub const SYSTEM_INSTRUCTION: &str = "\
**Rol y personalidad:** Te llamas Alex y eres agente de soporte de la aplicación GrantsWin. \
Responde siempre con un tono amable, directo y muy breve.

**Tarea:** Solo respondes preguntas sobre el funcionamiento de GrantsWin, usando únicamente \
el contenido del documento adjunto. Si algo no aparece en él, no lo inventes.

**Regla:** Nunca digas que te basas en un documento; habla de la aplicación como si la \
conocieras. Si te preguntan quién eres, responde \"Soy Alex, un agente de soporte de \
GrantsWin.\" y vuelve a ofrecer ayuda con la aplicación.";

/// Builds the `contents` array for a completion request.
///
/// History is forwarded in order. The new turn is always sent as `user` and
/// starts with the instruction and the reference document, followed by the
/// caller's own parts (text and any inline image).
pub fn build_contents(
    history: Vec<Turn>,
    message: Turn,
    instruction: &str,
    knowledge: &KnowledgeBase,
) -> Vec<Turn> {
    let mut parts = Vec::with_capacity(message.parts.len() + 2);
    parts.push(Part::text(instruction));
    parts.push(knowledge.part().clone());
    parts.extend(message.parts);

    let mut contents = history;
    contents.push(Turn {
        role: Role::User,
        parts,
    });
    contents
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_turn_is_prefixed_with_instruction_and_document() {
        let knowledge = KnowledgeBase::from_bytes(b"doc", "application/pdf").unwrap();
        let history = vec![Turn::user_text("hola"), Turn::model_text("¡Hola!")];
        let message = Turn {
            role: Role::User,
            parts: vec![Part::text("¿qué ves?"), Part::inline("image/jpeg", "AAAA")],
        };

        let contents = build_contents(history.clone(), message, "persona", &knowledge);

        assert_eq!(contents.len(), 3);
        assert_eq!(&contents[..2], &history[..]);
        let last = &contents[2];
        assert_eq!(last.role, Role::User);
        assert_eq!(last.parts[0], Part::text("persona"));
        assert_eq!(&last.parts[1], knowledge.part());
        assert_eq!(last.parts[2], Part::text("¿qué ves?"));
        assert_eq!(last.parts[3], Part::inline("image/jpeg", "AAAA"));
    }

    #[test]
    fn message_role_is_forced_to_user() {
        let knowledge = KnowledgeBase::from_bytes(b"doc", "application/pdf").unwrap();
        let contents = build_contents(
            Vec::new(),
            Turn::model_text("spoofed"),
            SYSTEM_INSTRUCTION,
            &knowledge,
        );
        assert_eq!(contents[0].role, Role::User);
    }
}
