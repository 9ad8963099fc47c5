use leptos::prelude::*;
use leptos::task::spawn_local;

use invomail_shared::invoice::ScrapedStats;

use crate::auth::use_api;

/// 已抓取数据的统计卡片；失败时静默保持零值（空态不报错）
#[component]
pub fn StatsCards() -> impl IntoView {
    let api = use_api();

    let (stats, set_stats) = signal(ScrapedStats::default());

    Effect::new(move |_| {
        let api = api.clone();
        spawn_local(async move {
            if let Ok(data) = api.get_scraped_stats(None, None).await {
                set_stats.try_set(data);
            }
        });
    });

    view! {
        <div class="stats shadow w-full stats-vertical md:stats-horizontal bg-base-100 mb-6">
            <div class="stat">
                <div class="stat-title">"Total invoices"</div>
                <div class="stat-value text-primary">{move || stats.get().total}</div>
                <div class="stat-desc">
                    {move || {
                        let s = stats.get();
                        format!("{} PDF · {} XML", s.pdf_count, s.xml_count)
                    }}
                </div>
            </div>
            <div class="stat">
                <div class="stat-title">"Pending"</div>
                <div class="stat-value text-warning">{move || stats.get().pending}</div>
            </div>
            <div class="stat">
                <div class="stat-title">"Approved"</div>
                <div class="stat-value text-success">{move || stats.get().approved}</div>
            </div>
            <div class="stat">
                <div class="stat-title">"Total amount"</div>
                <div class="stat-value text-secondary text-2xl">
                    {move || format!("{:.2}", stats.get().total_amount)}
                </div>
            </div>
        </div>
    }
}
