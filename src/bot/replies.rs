//! User-facing reply texts.

pub const WELCOME: &str = "👋 Привет! Я бот, который расскажет интересные факты о любом месте.\n\n\
📍 Просто отправьте мне свою геолокацию, и я найду что-то необычное \
в радиусе 500 метров от вас!\n\n\
Используйте кнопку 📎 и выберите «Локация» для отправки.";

pub const HELP: &str = "ℹ️ Как использовать бота:\n\n\
1. Нажмите кнопку 📎 (скрепка)\n\
2. Выберите «Локация» или «Геопозиция»\n\
3. Отправьте свою текущую локацию\n\
4. Получите интересный факт!\n\n\
⚡ Ограничения: не более 1 запроса в 5 секунд";

pub const RATE_LIMITED: &str = "⏳ Пожалуйста, подождите немного перед следующим запросом. \
Можно отправлять не более одной локации в 5 секунд.";

pub const NO_FACT: &str = "😔 Не смог найти интересный факт об этом месте. \
Попробуйте отправить другую точку!";

pub fn fact(fact: &str) -> String {
    format!("📍 {}", fact)
}
