//! Fixed vocabularies that fixtures are drawn from.
//!
//! The hobby pool deliberately keeps its repeated entries: hobbies are drawn
//! by position, so a popular entry can be picked twice for one fixture and
//! is drawn more often overall. Historical result sets were produced with
//! this exact pool.

/// First names for generated subjects.
pub const FIRST_NAMES: &[&str] = &[
    "Alice", "Bob", "Charlie", "David", "Eve", "Frank", "Grace", "Heidi", "Ivan", "Judy", "Kevin",
    "Linda", "Mallory", "Yousef", "Nancy", "Oscar", "Peggy", "Romeo", "Sue", "Trent", "Ursula",
    "Victor", "Walter", "Xavier", "Yvonne", "Zelda", "Ling", "Jin", "Hubert", "Pit",
];

/// Surnames for generated subjects.
pub const SURNAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Jones", "Brown", "Davis", "Miller", "Wilson", "Moore",
    "Taylor", "Anderson", "Thomas", "Jackson", "White", "Harris", "Martin", "Thompson", "Garcia",
    "Martinez", "Robinson", "Clark", "Rodriguez", "Lewis", "Lee", "Walker", "Hall", "Allen",
    "Young", "Hernandez", "King", "Wright", "Lopez", "Hill", "Scott", "Green", "Adams", "Baker",
    "Gonzalez", "Nelson", "Carter", "Mitchell", "Perez", "Roberts", "Turner", "Phillips",
    "Campbell", "Parker", "Evans", "Edwards", "Collins", "Stewart", "Sanchez", "Morris", "Rogers",
    "Reed", "Cook", "Morgan", "Bell", "Murphy", "Bailey", "Rivera", "Cooper", "Richardson", "Cox",
    "Howard", "Ward", "Torres", "Peterson", "Gray", "Ramirez", "James", "Watson", "Brooks",
    "Kelly", "Sanders", "Price", "Bennett", "Wood", "Barnes", "Ross", "Henderson", "Coleman",
    "Jenkins", "Perry", "Powell", "Long", "Patterson", "Hughes", "Flores", "Washington", "Butler",
    "Simmons", "Foster", "Gonzales", "Bryant", "Alexander", "Russell", "Griffin", "Diaz", "Hayes",
    "Wang", "Yang",
];

/// Hobby pool, repeated entries included.
pub const HOBBIES: &[&str] = &[
    "reading", "writing", "drawing", "painting", "sculpting", "photography", "gardening",
    "cooking", "baking", "sewing", "knitting", "crocheting", "quilting", "embroidering",
    "weaving", "spinning", "dancing", "singing", "playing a musical instrument", "acting",
    "directing", "producing", "editing", "composing music", "arranging music", "conducting",
    "playing a sport", "exercising", "meditating", "praying", "worshiping", "preaching",
    "teaching", "tutoring", "mentoring", "coaching", "counseling", "consulting", "advising",
    "planning", "organizing", "managing", "leading", "following", "serving", "helping",
    "assisting", "supporting", "encouraging", "motivating", "inspiring", "influencing",
    "persuading", "convincing", "negotiating", "bargaining", "trading", "selling", "marketing",
    "advertising", "promoting", "publicizing", "public speaking", "presenting", "lecturing",
    "educating", "training", "coaching", "mentoring", "tutoring", "teaching", "instructing",
    "guiding", "counseling", "advising", "consulting", "coaching", "mentoring", "tutoring",
    "teaching", "instructing", "guiding", "counseling", "advising", "consulting", "coaching",
    "mentoring", "tutoring", "teaching", "instructing", "guiding", "counseling", "advising",
    "consulting", "coaching", "mentoring", "tutoring", "teaching", "instructing", "guiding",
    "counseling", "advising", "consulting", "coaching", "mentoring", "tutoring", "teaching",
    "instructing", "guiding", "counseling", "advising", "consulting", "coaching", "mentoring",
    "tutoring", "teaching", "programming",
];

/// Moods the prompt offers for each day, also used by the extended rubric.
pub const MOODS: &[&str] = &[
    "happy",
    "sad",
    "triumphant",
    "eerie",
    "energetic",
    "romantic",
    "epic",
    "peaceful",
];

/// Canonical weekday spellings, Monday first.
pub const WEEKDAYS: &[&str] = &[
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
