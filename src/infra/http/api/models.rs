//! Conversions between wire types and application types.

pub use bookshelf_api_types::{
    BookMetaFields, BookResponse, BookWriteRequest, DashboardResponse, SettingsPatchRequest,
    SettingsResponse, TermCountResponse,
};

use crate::application::books::BookCommand;
use crate::application::settings::SettingsPatch;
use crate::domain::books::{BookMeta, BookRecord, TermCount};
use crate::domain::settings::BookSettings;

pub fn book_command(request: BookWriteRequest) -> BookCommand {
    let BookMetaFields {
        author_name,
        price,
        publisher,
        year,
        edition,
        url,
    } = request.meta;

    BookCommand {
        title: request.title,
        content: request.content,
        excerpt: request.excerpt,
        meta: BookMeta {
            author_name,
            price,
            publisher,
            year,
            edition,
            url,
        },
        categories: request.categories,
        tags: request.tags,
        autosave: request.autosave,
    }
}

pub fn book_response(record: BookRecord) -> BookResponse {
    BookResponse {
        id: record.id,
        title: record.title,
        content: record.content,
        excerpt: record.excerpt,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

pub fn settings_patch(request: SettingsPatchRequest) -> SettingsPatch {
    SettingsPatch {
        currency: request.currency,
        books_per_page: request.books_per_page,
    }
}

pub fn settings_response(settings: BookSettings) -> SettingsResponse {
    SettingsResponse {
        currency: settings.currency.as_str().to_string(),
        currency_symbol: settings.currency.symbol().to_string(),
        books_per_page: settings.books_per_page,
        updated_at: settings.updated_at,
    }
}

pub fn dashboard_response(top_categories: Vec<TermCount>) -> DashboardResponse {
    DashboardResponse {
        top_categories: top_categories
            .into_iter()
            .map(|term| TermCountResponse {
                name: term.name,
                slug: term.slug,
                count: term.count,
            })
            .collect(),
    }
}
