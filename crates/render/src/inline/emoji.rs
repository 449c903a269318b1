//! `:shortcode:` emoji table.

/// Looks up the emoji for a shortcode name (without colons).
pub fn lookup(name: &str) -> Option<&'static str> {
    let emoji = match name {
        "smile" => "😄",
        "laughing" => "😆",
        "blush" => "😊",
        "heart_eyes" => "😍",
        "kissing_heart" => "😘",
        "relaxed" => "☺️",
        "wink" => "😉",
        "grin" => "😁",
        "joy" => "😂",
        "sweat_smile" => "😅",
        "rofl" => "🤣",
        "thinking" => "🤔",
        "zipper_mouth" => "🤐",
        "neutral_face" => "😐",
        "expressionless" => "😑",
        "confused" => "😕",
        "worried" => "😟",
        "slightly_frowning_face" => "🙁",
        "frowning_face" => "☹️",
        "persevere" => "😣",
        "disappointed" => "😞",
        "sweat" => "😓",
        "tired_face" => "😫",
        "cry" => "😢",
        "sob" => "😭",
        "triumph" => "😤",
        "angry" => "😠",
        "rage" => "😡",
        "no_mouth" => "😶",
        "sleeping" => "😴",
        "+1" => "👍",
        "thumbsup" => "👍",
        "-1" => "👎",
        "thumbsdown" => "👎",
        "clap" => "👏",
        "raised_hands" => "🙌",
        "pray" => "🙏",
        "wave" => "👋",
        "ok_hand" => "👌",
        "point_up" => "☝️",
        "point_down" => "👇",
        "point_left" => "👈",
        "point_right" => "👉",
        "muscle" => "💪",
        "heart" => "❤️",
        "blue_heart" => "💙",
        "green_heart" => "💚",
        "yellow_heart" => "💛",
        "purple_heart" => "💜",
        "broken_heart" => "💔",
        "sparkling_heart" => "💖",
        "star" => "⭐",
        "star2" => "🌟",
        "sparkles" => "✨",
        "boom" => "💥",
        "fire" => "🔥",
        "tada" => "🎉",
        "confetti_ball" => "🎊",
        "rocket" => "🚀",
        "zap" => "⚡",
        "bulb" => "💡",
        "bell" => "🔔",
        "mega" => "📣",
        "loudspeaker" => "📢",
        "warning" => "⚠️",
        "white_check_mark" => "✅",
        "x" => "❌",
        "heavy_check_mark" => "✔️",
        "heavy_multiplication_x" => "✖️",
        "question" => "❓",
        "grey_question" => "❔",
        "exclamation" => "❗",
        "grey_exclamation" => "❕",
        "heavy_plus_sign" => "➕",
        "heavy_minus_sign" => "➖",
        "pencil2" => "✏️",
        "memo" => "📝",
        "book" => "📖",
        "books" => "📚",
        "bookmark" => "🔖",
        "mag" => "🔍",
        "mag_right" => "🔎",
        "lock" => "🔒",
        "unlock" => "🔓",
        "key" => "🔑",
        "link" => "🔗",
        "computer" => "💻",
        "email" => "📧",
        "inbox_tray" => "📥",
        "outbox_tray" => "📤",
        "package" => "📦",
        "file_folder" => "📁",
        "open_file_folder" => "📂",
        "page_facing_up" => "📄",
        "calendar" => "📅",
        "chart_with_upwards_trend" => "📈",
        "chart_with_downwards_trend" => "📉",
        "bar_chart" => "📊",
        "clipboard" => "📋",
        "pushpin" => "📌",
        "round_pushpin" => "📍",
        "paperclip" => "📎",
        "straight_ruler" => "📏",
        "wrench" => "🔧",
        "hammer" => "🔨",
        "gear" => "⚙️",
        "nut_and_bolt" => "🔩",
        "seedling" => "🌱",
        "evergreen_tree" => "🌲",
        "deciduous_tree" => "🌳",
        "palm_tree" => "🌴",
        "cactus" => "🌵",
        "herb" => "🌿",
        "shamrock" => "☘️",
        "four_leaf_clover" => "🍀",
        "bug" => "🐛",
        "bee" => "🐝",
        "bird" => "🐦",
        "dog" => "🐶",
        "cat" => "🐱",
        "penguin" => "🐧",
        "turtle" => "🐢",
        "fish" => "🐟",
        "coffee" => "☕",
        "tea" => "🍵",
        "beer" => "🍺",
        "beers" => "🍻",
        "wine_glass" => "🍷",
        "pizza" => "🍕",
        "hamburger" => "🍔",
        "fries" => "🍟",
        "cake" => "🍰",
        "birthday" => "🎂",
        "cookie" => "🍪",
        "doughnut" => "🍩",
        "apple" => "🍎",
        "green_apple" => "🍏",
        "banana" => "🍌",
        "strawberry" => "🍓",
        "house" => "🏠",
        "office" => "🏢",
        "hospital" => "🏥",
        "school" => "🏫",
        "car" => "🚗",
        "taxi" => "🚕",
        "bus" => "🚌",
        "train" => "🚂",
        "airplane" => "✈️",
        "ship" => "🚢",
        "bike" => "🚲",
        "soccer" => "⚽",
        "basketball" => "🏀",
        "football" => "🏈",
        "baseball" => "⚾",
        "tennis" => "🎾",
        "trophy" => "🏆",
        "medal" => "🏅",
        "dart" => "🎯",
        "game_die" => "🎲",
        "musical_note" => "🎵",
        "notes" => "🎶",
        "art" => "🎨",
        "camera" => "📷",
        "movie_camera" => "🎥",
        "checkered_flag" => "🏁",
        "triangular_flag_on_post" => "🚩",
        "flag_us" => "🇺🇸",
        "flag_gb" => "🇬🇧",
        "flag_fr" => "🇫🇷",
        "flag_de" => "🇩🇪",
        "flag_jp" => "🇯🇵",
        "flag_cn" => "🇨🇳",
        _ => return None,
    };
    Some(emoji)
}

#[cfg(test)]
mod tests {
    use super::lookup;

    #[test]
    fn known_and_unknown() {
        assert_eq!(lookup("rocket"), Some("🚀"));
        assert_eq!(lookup("+1"), Some("👍"));
        assert_eq!(lookup("purple_heart"), Some("💜"));
        assert_eq!(lookup("not_an_emoji"), None);
    }
}
