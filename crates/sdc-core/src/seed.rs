//! Default data written to an empty store on first access.

use crate::{Result, conversation::Conversation, profile::Profile};

/// The default profile set. Profile 1 is the administrator account.
pub const PROFILES_JSON: &str = r#"[
  {
    "id": 1,
    "name": "Admin",
    "email": "admin@sdconnect.example",
    "password": "12345",
    "age": 49,
    "location": "London, UK",
    "imageUrl": "https://placehold.co/600x750.png",
    "hint": "portrait man",
    "role": "daddy",
    "online": false,
    "verified": true,
    "bio": "Entrepreneur with a passion for the finer things in life. Enjoys mentoring ambitious people and exploring the world.",
    "wants": ["Mentorship", "Discreet", "Long-term", "Travel Partner"],
    "interests": ["Art", "Travel", "Fine Dining", "Theatre", "Wine Tasting"],
    "gallery": ["https://placehold.co/600x401.png", "https://placehold.co/600x402.png"],
    "attributes": { "Height": "6'1\"", "Body Type": "Athletic", "Smoker": "No", "Drinker": "Socially" }
  },
  {
    "id": 2,
    "name": "Darianna",
    "email": "darianna@example.com",
    "password": "password123",
    "age": 24,
    "location": "London, UK",
    "imageUrl": "https://placehold.co/600x751.png",
    "hint": "portrait woman",
    "role": "baby",
    "online": true,
    "verified": true,
    "bio": "Art student with a love for adventure and exploring new cultures.",
    "wants": ["Mentorship", "Long-term"],
    "interests": ["Art", "Travel", "Music"],
    "metCount": 1,
    "notMetCount": 1,
    "votes": [
      { "voterId": 4, "choice": "met" },
      { "voterId": 6, "choice": "notMet" }
    ]
  },
  {
    "id": 3,
    "name": "Kateryna",
    "email": "kateryna@example.com",
    "password": "password123",
    "age": 22,
    "location": "Birmingham, UK",
    "imageUrl": "https://placehold.co/600x752.png",
    "hint": "portrait woman",
    "role": "baby",
    "online": true,
    "verified": false,
    "bio": "Marketing graduate who loves fitness and cooking.",
    "wants": ["Friendship", "Travel Partner"],
    "interests": ["Fitness", "Cooking", "Movies"]
  },
  {
    "id": 4,
    "name": "Mark",
    "email": "mark@example.com",
    "password": "password123",
    "age": 52,
    "location": "Glasgow, UK",
    "imageUrl": "https://placehold.co/600x753.png",
    "hint": "portrait man",
    "role": "daddy",
    "online": false,
    "verified": true,
    "bio": "Architect, sailor and amateur chef.",
    "wants": ["Long-term", "Discreet"],
    "interests": ["Sports", "Fine Dining", "Reading"]
  },
  {
    "id": 5,
    "name": "Sofia",
    "email": "sofia@example.com",
    "password": "password123",
    "age": 26,
    "location": "Liverpool, UK",
    "imageUrl": "https://placehold.co/600x754.png",
    "hint": "portrait woman",
    "role": "baby",
    "online": true,
    "verified": true,
    "bio": "Nurse with a soft spot for live music and good food.",
    "wants": ["Casual", "Friendship"],
    "interests": ["Music", "Fine Dining", "Travel"]
  },
  {
    "id": 6,
    "name": "James",
    "email": "james@example.com",
    "password": "password123",
    "age": 38,
    "location": "Bristol, UK",
    "imageUrl": "https://placehold.co/600x755.png",
    "hint": "portrait man",
    "role": "daddy",
    "online": true,
    "verified": false,
    "bio": "Tech founder who spends weekends hiking.",
    "wants": ["Networking", "Friendship"],
    "interests": ["Travel", "Fitness"]
  },
  {
    "id": 7,
    "name": "Vanessa",
    "email": "vanessa@example.com",
    "password": "password123",
    "age": 21,
    "location": "Leeds, UK",
    "imageUrl": "https://placehold.co/600x756.png",
    "hint": "portrait woman",
    "role": "baby",
    "online": false,
    "verified": true,
    "bio": "Fashion student and aspiring designer.",
    "wants": ["Mentorship", "Travel Partner"],
    "interests": ["Art", "Theatre"]
  },
  {
    "id": 8,
    "name": "Richard",
    "email": "richard@example.com",
    "password": "password123",
    "age": 49,
    "location": "Edinburgh, UK",
    "imageUrl": "https://placehold.co/600x757.png",
    "hint": "portrait man",
    "role": "daddy",
    "online": true,
    "verified": true,
    "bio": "Investment banker who collects wine.",
    "wants": ["Discreet", "Long-term"],
    "interests": ["Wine Tasting", "Theatre"]
  }
]"#;

/// The default conversations, all seen from the administrator's inbox.
pub const CONVERSATIONS_JSON: &str = r#"[
  {
    "id": 1,
    "participantId": 2,
    "unreadCount": 1,
    "messages": [
      { "id": "6d0c2f4e-2b1a-4c1e-9b0a-000000000101", "senderId": 2, "text": "Hey there! Loved your profile, especially your taste in art.", "timestamp": "2024-07-28T10:00:00Z" }
    ]
  },
  {
    "id": 2,
    "participantId": 3,
    "unreadCount": 0,
    "messages": [
      { "id": "6d0c2f4e-2b1a-4c1e-9b0a-000000000201", "senderId": 1, "text": "Good morning, Kateryna. I hope you have a great day.", "timestamp": "2024-07-27T09:00:00Z" },
      { "id": "6d0c2f4e-2b1a-4c1e-9b0a-000000000202", "senderId": 3, "text": "Morning! You too. Thanks for the message :)", "timestamp": "2024-07-27T09:12:00Z" },
      { "id": "6d0c2f4e-2b1a-4c1e-9b0a-000000000203", "senderId": 1, "text": "Any plans for the upcoming week?", "timestamp": "2024-07-27T18:30:00Z" },
      { "id": "6d0c2f4e-2b1a-4c1e-9b0a-000000000204", "senderId": 3, "text": "Not yet! Still trying to figure things out. You?", "timestamp": "2024-07-27T18:35:00Z" }
    ]
  },
  {
    "id": 3,
    "participantId": 5,
    "unreadCount": 1,
    "messages": [
      { "id": "6d0c2f4e-2b1a-4c1e-9b0a-000000000301", "senderId": 5, "text": "Your profile mentioned you enjoy fine dining. Any favorite spots?", "timestamp": "2024-07-26T15:00:00Z" }
    ]
  },
  {
    "id": 4,
    "participantId": 7,
    "unreadCount": 1,
    "messages": [
      { "id": "6d0c2f4e-2b1a-4c1e-9b0a-000000000401", "senderId": 7, "text": "Hi! What's the most amazing place you've visited?", "timestamp": "2024-07-28T12:00:00Z" }
    ]
  }
]"#;

pub fn profiles() -> Result<Vec<Profile>> { Ok(serde_json::from_str(PROFILES_JSON)?) }

pub fn conversations() -> Result<Vec<Conversation>> {
  Ok(serde_json::from_str(CONVERSATIONS_JSON)?)
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use super::*;
  use crate::vote::VoteChoice;

  #[test]
  fn seed_profiles_parse_with_unique_ids() {
    let profiles = profiles().unwrap();
    let ids: HashSet<_> = profiles.iter().map(|p| p.id).collect();
    assert_eq!(ids.len(), profiles.len());
  }

  #[test]
  fn seed_vote_counters_are_consistent() {
    for p in profiles().unwrap() {
      let met = p.votes.iter().filter(|v| v.choice == VoteChoice::Met).count();
      assert_eq!(p.met_count as usize, met, "profile {}", p.id);
      assert_eq!(p.not_met_count as usize, p.votes.len() - met, "profile {}", p.id);
    }
  }

  #[test]
  fn seed_conversations_reference_seed_profiles() {
    let ids: HashSet<_> = profiles().unwrap().iter().map(|p| p.id).collect();
    for c in conversations().unwrap() {
      assert!(c.is_persisted());
      assert!(ids.contains(&c.participant_id));
    }
  }
}
