// Built-in challenge catalog, loaded into an empty database at startup.
use crate::domain::challenge::{self, NewChallenge};
use crate::state::DbPool;
use crate::store::StoreError;

struct SeedChallenge {
    title: &'static str,
    description: &'static str,
    category: &'static str,
    points: i64,
    icon: &'static str,
}

const CATALOG: &[SeedChallenge] = &[
    SeedChallenge {
        title: "7-Day Compliment Streak",
        description: "Give your partner a genuine compliment every day for a week. Share what you appreciate about them, from personality traits to small gestures.",
        category: "daily",
        points: 20,
        icon: "💬",
    },
    SeedChallenge {
        title: "Date Night In",
        description: "Plan and enjoy a special at-home date night. Cook a meal together, set a nice atmosphere, and enjoy quality time without distractions.",
        category: "one-time",
        points: 15,
        icon: "🍽️",
    },
    SeedChallenge {
        title: "Photo Memory Hunt",
        description: "Recreate a favorite photo from your relationship. Try to match the original setting, poses, and expressions, then share both images.",
        category: "advanced",
        points: 25,
        icon: "📸",
    },
    SeedChallenge {
        title: "Surprise Message",
        description: "Leave a surprise note or message for your partner to find. Hide it somewhere unexpected to brighten their day.",
        category: "beginner",
        points: 10,
        icon: "✉️",
    },
    SeedChallenge {
        title: "Try a New Recipe Together",
        description: "Cook a meal you've never made before as a team. Explore a new cuisine or challenging dish and enjoy the results together.",
        category: "one-time",
        points: 15,
        icon: "🍲",
    },
    SeedChallenge {
        title: "Unplugged Evening",
        description: "Spend an evening together with no phones or screens. Connect through conversation, games, or simply enjoying each other's company.",
        category: "weekly",
        points: 20,
        icon: "🔌",
    },
    SeedChallenge {
        title: "Gratitude Journal",
        description: "Each write 3 things you're grateful for about each other and share them. Focus on recent events or ongoing qualities you appreciate.",
        category: "daily",
        points: 15,
        icon: "📝",
    },
    SeedChallenge {
        title: "Outdoor Adventure",
        description: "Go for a walk, hike, or picnic together in nature. Discover a new location or revisit a favorite spot.",
        category: "one-time",
        points: 20,
        icon: "🏞️",
    },
    SeedChallenge {
        title: "Book Club for Two",
        description: "Read the same book and discuss it together. Choose something you're both interested in and share your perspectives.",
        category: "advanced",
        points: 25,
        icon: "📚",
    },
    SeedChallenge {
        title: "Movie Marathon",
        description: "Watch 2+ movies from each other's favorite genres. Take turns selecting films that are meaningful to you.",
        category: "one-time",
        points: 15,
        icon: "🎬",
    },
    SeedChallenge {
        title: "Fitness Challenge",
        description: "Complete a workout or yoga session together. Support each other through the activity and celebrate your achievement.",
        category: "weekly",
        points: 20,
        icon: "🏋️",
    },
    SeedChallenge {
        title: "Random Acts of Kindness",
        description: "Do something kind for your partner without telling them in advance. Notice what would make their day better and surprise them.",
        category: "beginner",
        points: 10,
        icon: "🎁",
    },
    SeedChallenge {
        title: "Bucket List Planning",
        description: "Add 3 new items to your couple's bucket list. Dream together about future experiences you want to share.",
        category: "one-time",
        points: 15,
        icon: "🗒️",
    },
    SeedChallenge {
        title: "DIY Project",
        description: "Build or craft something together. Create art, décor, or something functional for your home.",
        category: "advanced",
        points: 25,
        icon: "🔨",
    },
    SeedChallenge {
        title: "Memory Lane",
        description: "Look through old photos and share your favorite memories. Reminisce about your journey together so far.",
        category: "one-time",
        points: 15,
        icon: "🖼️",
    },
    SeedChallenge {
        title: "Love Letter Exchange",
        description: "Write and exchange heartfelt letters. Express your feelings in writing and read them to each other.",
        category: "advanced",
        points: 20,
        icon: "💌",
    },
    SeedChallenge {
        title: "Learn Something New",
        description: "Take an online class or tutorial together. Develop a new skill or explore a subject you're both curious about.",
        category: "one-time",
        points: 20,
        icon: "🧠",
    },
    SeedChallenge {
        title: "Early Morning Date",
        description: "Wake up early and watch the sunrise together. Start the day with a special moment of connection.",
        category: "one-time",
        points: 20,
        icon: "🌅",
    },
    SeedChallenge {
        title: "Game Night",
        description: "Play a board game or video game as a team. Work together to win or compete in a friendly way.",
        category: "weekly",
        points: 15,
        icon: "🎲",
    },
    SeedChallenge {
        title: "Plan a Future Trip",
        description: "Research and dream about a place you want to visit together. Create a vision for your next adventure.",
        category: "one-time",
        points: 15,
        icon: "✈️",
    },
];

/// Insert the built-in catalog unless any challenge already exists.
/// Returns how many rows were inserted.
pub fn seed_challenges(pool: &DbPool) -> Result<usize, StoreError> {
    if challenge::count(pool)? > 0 {
        tracing::info!("Challenges already present, skipping seed");
        return Ok(0);
    }

    let mut conn = pool.get()?;
    let tx = conn.transaction()?;
    for seed in CATALOG {
        challenge::insert(
            &tx,
            &NewChallenge {
                title: seed.title.to_string(),
                description: Some(seed.description.to_string()),
                category: Some(seed.category.to_string()),
                points: seed.points,
                icon: Some(seed.icon.to_string()),
                active: true,
            },
        )?;
    }
    tx.commit()?;

    tracing::info!("Seeded {} challenges", CATALOG.len());
    Ok(CATALOG.len())
}
