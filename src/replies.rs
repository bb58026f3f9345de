//! Fixed texts the bot sends back to chats.

/// Reply to `/start`
pub const GREETING: &str = "欢迎使用 我们之间的翻译 bot. 我会自动翻译俄语和中文之间的消息。";

/// Reply to voice and audio messages
pub const VOICE_PENDING: &str =
    "🎤 语音消息已收到！语音翻译功能正在开发中，请先发送文字消息进行翻译。";

/// Reply when every provider is out of quota
pub const BUSY: &str = "⏳ sever is busy ,try again later!";
