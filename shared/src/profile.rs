//! Editing the signed-in user's own profile.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ProfileUpdateError;
use crate::model::Profile;

pub const PROFILE_UPDATED_MESSAGE: &str = "Profile updated successfully";
pub const PROFILE_UPDATE_FAILED_MESSAGE: &str = "Failed to update profile";

pub const NAME_MAX_CHARS: usize = 50;
pub const BIO_MAX_CHARS: usize = 160;
pub const LOCATION_MAX_CHARS: usize = 30;

/// Body of `PUT /api/users/profile`. Empty strings clear a field.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    pub name: String,
    pub bio: String,
    pub location: String,
    pub website: String,
    pub profile_image: String,
    pub cover_image: String,
}

impl ProfileUpdate {
    /// Pre-fills the form from a loaded profile.
    #[must_use]
    pub fn from_profile(profile: &Profile) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            name: profile.name.clone(),
            bio: text(&profile.bio),
            location: text(&profile.location),
            website: text(&profile.website),
            profile_image: text(&profile.profile_image),
            cover_image: text(&profile.cover_image),
        }
    }

    pub fn validate(&self) -> Result<(), ProfileUpdateError> {
        if self.name.trim().is_empty() {
            return Err(ProfileUpdateError::NameRequired);
        }
        for (field, value, max) in [
            ("name", &self.name, NAME_MAX_CHARS),
            ("bio", &self.bio, BIO_MAX_CHARS),
            ("location", &self.location, LOCATION_MAX_CHARS),
        ] {
            if value.chars().count() > max {
                return Err(ProfileUpdateError::TooLong { field, max });
            }
        }

        let website = self.website.trim();
        if !website.is_empty() {
            let url = Url::parse(website)
                .map_err(|e| ProfileUpdateError::InvalidWebsite(format!("{website}: {e}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ProfileUpdateError::InvalidWebsite(website.to_string()));
            }
        }
        Ok(())
    }
}

/// One save may be in flight at a time.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileEditor {
    pub saving: bool,
}

impl ProfileEditor {
    pub fn begin_save(&mut self, update: ProfileUpdate) -> Result<ProfileUpdate, ProfileUpdateError> {
        if self.saving {
            return Err(ProfileUpdateError::AlreadySaving);
        }
        update.validate()?;
        self.saving = true;
        Ok(update)
    }

    pub fn finish_save(&mut self) {
        self.saving = false;
    }
}
