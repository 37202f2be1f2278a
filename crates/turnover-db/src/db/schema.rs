// Mirrors migrations/2024-06-01-000000_init/up.sql.

diesel::table! {
    calendar_event (id) {
        id -> Uuid,
        listing_id -> Uuid,
        feed_id -> Nullable<Uuid>,
        external_id -> Text,
        role -> Text,
        event_date -> Date,
        start_time -> Timestamptz,
        end_time -> Timestamptz,
        title -> Text,
        guest_name -> Nullable<Text>,
        checkout_type -> Text,
        checkout_time -> Time,
        is_active -> Bool,
        version -> Int4,
        fingerprint -> Text,
        last_synced -> Timestamptz,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    cleaner (id) {
        id -> Uuid,
        name -> Text,
        email -> Text,
        phone -> Nullable<Text>,
        role -> Text,
        hourly_rate -> Float8,
        password_hash -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    cleaner_assignment (id) {
        id -> Uuid,
        event_id -> Uuid,
        cleaner_id -> Uuid,
        hours -> Float8,
        is_active -> Bool,
        started_at -> Nullable<Timestamptz>,
        completed_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    cleaner_payment_report (id) {
        id -> Uuid,
        cleaner_id -> Nullable<Uuid>,
        week_start -> Date,
        week_end -> Date,
        total_hours -> Float8,
        total_amount -> Float8,
        report_data -> Jsonb,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    event_version (id) {
        id -> Uuid,
        event_id -> Uuid,
        version -> Int4,
        start_time -> Timestamptz,
        end_time -> Timestamptz,
        status -> Text,
        recorded_at -> Timestamptz,
    }
}

diesel::table! {
    extra_hours_report (id) {
        id -> Uuid,
        cleaner_id -> Uuid,
        listing_id -> Nullable<Uuid>,
        work_date -> Date,
        hours -> Float8,
        description -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    ical_feed (id) {
        id -> Uuid,
        name -> Text,
        url -> Text,
        is_active -> Bool,
        last_synced -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    listing (id) {
        id -> Uuid,
        name -> Text,
        external_id -> Nullable<Text>,
        color -> Nullable<Text>,
        bank_account -> Nullable<Text>,
        hours_per_clean -> Nullable<Float8>,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    listing_feed (listing_id, feed_id) {
        listing_id -> Uuid,
        feed_id -> Uuid,
    }
}

diesel::table! {
    notification (id) {
        id -> Uuid,
        cleaner_id -> Nullable<Uuid>,
        event_id -> Nullable<Uuid>,
        kind -> Text,
        message -> Text,
        is_read -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    sync_log_entry (id) {
        id -> Uuid,
        session_id -> Uuid,
        listing_id -> Nullable<Uuid>,
        feed_id -> Nullable<Uuid>,
        event_id -> Nullable<Uuid>,
        operation -> Text,
        details -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    sync_session (id) {
        id -> Uuid,
        scope -> Text,
        listing_id -> Nullable<Uuid>,
        status -> Text,
        added -> Int4,
        updated -> Int4,
        deactivated -> Int4,
        replaced -> Int4,
        unchanged -> Int4,
        errors -> Int4,
        error_message -> Nullable<Text>,
        started_at -> Timestamptz,
        completed_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(calendar_event -> ical_feed (feed_id));
diesel::joinable!(calendar_event -> listing (listing_id));
diesel::joinable!(cleaner_assignment -> calendar_event (event_id));
diesel::joinable!(cleaner_assignment -> cleaner (cleaner_id));
diesel::joinable!(cleaner_payment_report -> cleaner (cleaner_id));
diesel::joinable!(event_version -> calendar_event (event_id));
diesel::joinable!(extra_hours_report -> cleaner (cleaner_id));
diesel::joinable!(extra_hours_report -> listing (listing_id));
diesel::joinable!(listing_feed -> ical_feed (feed_id));
diesel::joinable!(listing_feed -> listing (listing_id));
diesel::joinable!(notification -> calendar_event (event_id));
diesel::joinable!(notification -> cleaner (cleaner_id));
diesel::joinable!(sync_log_entry -> calendar_event (event_id));
diesel::joinable!(sync_log_entry -> ical_feed (feed_id));
diesel::joinable!(sync_log_entry -> listing (listing_id));
diesel::joinable!(sync_log_entry -> sync_session (session_id));
diesel::joinable!(sync_session -> listing (listing_id));

diesel::allow_tables_to_appear_in_same_query!(
    calendar_event,
    cleaner,
    cleaner_assignment,
    cleaner_payment_report,
    event_version,
    extra_hours_report,
    ical_feed,
    listing,
    listing_feed,
    notification,
    sync_log_entry,
    sync_session,
);
