use leptos::prelude::*;
use leptos::task::spawn_local;

use invomail_shared::retrieval::{RetrievalConfig, RetrievalLogEntry};

use crate::auth::use_api;
use crate::components::icons::RefreshCw;
use crate::config::AppConfig;

/// 自动取件：开关立即生效，配置变更经防抖窗口后落库
#[component]
pub fn RetrievalSection() -> impl IntoView {
    let api = use_api();
    let app_config = use_context::<AppConfig>().unwrap_or_default();
    let debounce_ms = app_config.settings_debounce_ms;

    let (enabled, set_enabled) = signal(false);
    let (config, set_config) = signal(RetrievalConfig::default());
    let (logs, set_logs) = signal(Vec::<RetrievalLogEntry>::new());
    let (loading, set_loading) = signal(true);
    let (saving, set_saving) = signal(false);
    let (running, set_running) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    // 防抖代际：只有最后一次修改触发的延迟写入会真正执行
    let save_generation = StoredValue::new(0u32);

    // 初始加载：状态、配置、日志
    {
        let api = api.clone();
        Effect::new(move |_| {
            let api = api.clone();
            spawn_local(async move {
                if let Ok(status) = api.get_retrieval_status().await {
                    set_enabled.try_set(status.enabled);
                }
                if let Ok(cfg) = api.get_retrieval_config().await {
                    set_config.try_set(cfg);
                }
                if let Ok(entries) = api.get_retrieval_logs().await {
                    set_logs.try_set(entries);
                }
                set_loading.try_set(false);
            });
        });
    }

    let toggle_enabled = {
        let api = api.clone();
        move |ev: web_sys::Event| {
            let next = event_target_checked(&ev);
            set_enabled.set(next);
            let api = api.clone();
            spawn_local(async move {
                if let Err(err) = api.set_retrieval_status(next).await {
                    set_error_msg.try_set(Some(err.to_string()));
                    // 写入失败回滚开关显示
                    set_enabled.try_set(!next);
                }
            });
        }
    };

    // 配置变更：推进代际，延迟固定窗口后仅最后一代真正落库
    let schedule_save = {
        let api = api.clone();
        move || {
            let generation = save_generation.get_value() + 1;
            save_generation.set_value(generation);
            let api = api.clone();
            spawn_local(async move {
                gloo_timers::future::TimeoutFuture::new(debounce_ms).await;
                if save_generation.get_value() != generation {
                    return;
                }
                set_saving.try_set(true);
                if let Err(err) = api.set_retrieval_config(&config.get_untracked()).await {
                    set_error_msg.try_set(Some(err.to_string()));
                }
                set_saving.try_set(false);
            });
        }
    };

    let run_now = {
        let api = api.clone();
        move |_| {
            let api = api.clone();
            set_running.set(true);
            spawn_local(async move {
                match api.run_retrieval_now().await {
                    Ok(()) => {
                        if let Ok(entries) = api.get_retrieval_logs().await {
                            set_logs.try_set(entries);
                        }
                    }
                    Err(err) => {
                        set_error_msg.try_set(Some(err.to_string()));
                    }
                }
                set_running.try_set(false);
            });
        }
    };

    view! {
        <div class="space-y-6">
            <div class="card bg-base-100 shadow-xl">
                <div class="card-body">
                    <div class="flex items-center justify-between">
                        <h2 class="card-title">"Automatic Data Retrieval"</h2>
                        <label class="label cursor-pointer gap-3">
                            <span class="label-text">
                                {move || if enabled.get() { "Enabled" } else { "Disabled" }}
                            </span>
                            <input
                                type="checkbox"
                                class="toggle toggle-primary"
                                prop:checked=enabled
                                on:change=toggle_enabled.clone()
                                disabled=move || loading.get()
                            />
                        </label>
                    </div>

                    <Show when=move || error_msg.get().is_some()>
                        <div class="alert alert-error text-sm py-2">
                            <span>{move || error_msg.get().unwrap_or_default()}</span>
                        </div>
                    </Show>

                    <div class="flex items-end gap-4 flex-wrap">
                        <label class="form-control">
                            <span class="label-text text-xs">"Scan interval (minutes)"</span>
                            <input
                                type="number"
                                min="5"
                                class="input input-bordered input-sm w-32"
                                prop:value=move || config.get().interval_minutes.to_string()
                                on:input={
                                    let schedule_save = schedule_save.clone();
                                    move |ev| {
                                        if let Ok(value) = event_target_value(&ev).parse::<u32>() {
                                            set_config.update(|c| c.interval_minutes = value);
                                            schedule_save();
                                        }
                                    }
                                }
                            />
                        </label>
                        <label class="label cursor-pointer gap-2">
                            <input
                                type="checkbox"
                                class="checkbox checkbox-sm"
                                prop:checked=move || config.get().unseen_only
                                on:change={
                                    let schedule_save = schedule_save.clone();
                                    move |ev| {
                                        let checked = event_target_checked(&ev);
                                        set_config.update(|c| c.unseen_only = checked);
                                        schedule_save();
                                    }
                                }
                            />
                            <span class="label-text">"Only unread"</span>
                        </label>
                        <label class="form-control flex-1 min-w-48">
                            <span class="label-text text-xs">"Folders (comma separated)"</span>
                            <input
                                type="text"
                                class="input input-bordered input-sm"
                                prop:value=move || config.get().folders.join(", ")
                                on:change={
                                    let schedule_save = schedule_save.clone();
                                    move |ev| {
                                        let folders = event_target_value(&ev)
                                            .split(',')
                                            .map(|s| s.trim().to_string())
                                            .filter(|s| !s.is_empty())
                                            .collect();
                                        set_config.update(|c| c.folders = folders);
                                        schedule_save();
                                    }
                                }
                            />
                        </label>
                        <button
                            class="btn btn-sm btn-primary gap-2"
                            disabled=move || running.get()
                            on:click=run_now.clone()
                        >
                            <RefreshCw attr:class=move || {
                                if running.get() { "h-4 w-4 animate-spin" } else { "h-4 w-4" }
                            } />
                            "Run now"
                        </button>
                    </div>

                    <Show when=move || saving.get()>
                        <p class="text-xs text-base-content/50">"Saving settings..."</p>
                    </Show>
                </div>
            </div>

            <div class="card bg-base-100 shadow-xl">
                <div class="card-body">
                    <h2 class="card-title">"Retrieval Log"</h2>
                    <Show when=move || logs.with(Vec::is_empty)>
                        <p class="text-sm text-base-content/50">"No retrieval runs logged yet."</p>
                    </Show>
                    <ul class="text-sm font-mono space-y-1">
                        <For
                            each={move || logs.get().into_iter().enumerate().collect::<Vec<_>>()}
                            key=|(idx, _)| *idx
                            children=move |(_, entry)| {
                                let stamp = entry
                                    .timestamp
                                    .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
                                    .unwrap_or_default();
                                let level = entry.level.clone().unwrap_or_else(|| "info".into());
                                view! {
                                    <li class="flex gap-2">
                                        <span class="opacity-50">{stamp}</span>
                                        <span class=move || {
                                            if level == "error" { "text-error" } else { "text-base-content" }
                                        }>
                                            {entry.message.clone().unwrap_or_default()}
                                        </span>
                                    </li>
                                }
                            }
                        />
                    </ul>
                </div>
            </div>
        </div>
    }
}
