//! Diesel table definitions mirroring `backend/migrations`.
//!
//! Keep in step with the migrations; `diesel print-schema` against a
//! migrated database regenerates this file.

diesel::table! {
    /// Authentication identities.
    ///
    /// `verification_code` and `verification_expires_at` are written and
    /// cleared together; a CHECK constraint keeps them null once active.
    accounts (id) {
        /// Primary key.
        id -> Uuid,
        /// Lower-cased email; unique.
        email -> Text,
        /// Credential digest; null for external identities.
        credential_digest -> Nullable<Text>,
        /// Display name.
        display_name -> Text,
        /// `administrator`, `professional`, or `client`.
        role -> Text,
        /// Whether verification has completed.
        is_active -> Bool,
        /// Outstanding verification code.
        verification_code -> Nullable<Text>,
        /// Store-clock expiry of the outstanding code.
        verification_expires_at -> Nullable<Timestamptz>,
        /// Creation instant.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Professional role profiles; carries the derived aggregate rating.
    professional_profiles (id) {
        /// Primary key.
        id -> Uuid,
        /// Owning account; unique.
        account_id -> Uuid,
        /// Display name copied at creation.
        display_name -> Text,
        /// Email copied at creation.
        email -> Text,
        /// Mean of active rating scores; null when unrated.
        average_rating -> Nullable<Float8>,
        /// Creation instant.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Client role profiles.
    client_profiles (id) {
        /// Primary key.
        id -> Uuid,
        /// Owning account; unique.
        account_id -> Uuid,
        /// Display name copied at creation.
        display_name -> Text,
        /// Email copied at creation.
        email -> Text,
        /// Creation instant.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Booked sessions, reduced to what rating resolution needs.
    sessions (id) {
        /// Primary key.
        id -> Uuid,
        /// Professional profile delivering the session.
        professional_id -> Uuid,
        /// Client profile that booked it.
        client_id -> Uuid,
        /// `scheduled`, `completed`, or `cancelled`.
        status -> Text,
        /// Creation instant.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Session ratings.
    ratings (id) {
        /// Primary key.
        id -> Uuid,
        /// Rated session.
        session_id -> Uuid,
        /// Score in 1..=5.
        score -> Int2,
        /// Optional comment.
        comment -> Nullable<Text>,
        /// `active` or `withdrawn`.
        state -> Text,
        /// Creation instant.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(professional_profiles -> accounts (account_id));
diesel::joinable!(client_profiles -> accounts (account_id));
diesel::joinable!(sessions -> professional_profiles (professional_id));
diesel::joinable!(sessions -> client_profiles (client_id));
diesel::joinable!(ratings -> sessions (session_id));

diesel::allow_tables_to_appear_in_same_query!(
    accounts,
    professional_profiles,
    client_profiles,
    sessions,
    ratings,
);
