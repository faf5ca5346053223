//! User-facing status lines and chat notices.

pub const CONNECTING: &str = "Conectando...";
pub const CONNECTED: &str = "Conectado";
pub const RECONNECTING: &str = "Reconectando...";
pub const CONNECTION_ERROR: &str = "Error de conexión.";
pub const LISTENING: &str = "Escuchando...";
pub const CLICK_TO_START: &str = "Haz clic para iniciar";

/// Replaces the placeholder when a chat turn fails.
pub const REPLY_ERROR: &str = "Lo siento, hubo un error al procesar la respuesta.";

pub const CONVERSATION_ON: &str = "Modo conversación activado. Habla cuando quieras.";
pub const CONVERSATION_OFF: &str = "Modo conversación desactivado.";

pub const SCREEN_SHARE_STARTED: &str =
    "¡Estás compartiendo tu pantalla! Ahora puedes hacerme preguntas sobre lo que ves.";
pub const SCREEN_SHARE_STOPPED: &str = "Has dejado de compartir la pantalla.";
pub const SCREEN_SHARE_FAILED: &str = "No se pudo iniciar la compartición de pantalla.";
