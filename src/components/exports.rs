use leptos::prelude::*;
use leptos::task::spawn_local;

use invomail_shared::export::{ExportRun, ExportTemplate, RunExportRequest};

use crate::auth::use_api;
use crate::components::icons::{Download, Plus, Trash2};

const ENTITIES: [&str; 3] = ["invoices", "suppliers", "rules"];
const FORMATS: [&str; 2] = ["CSV", "JSON"];

fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

/// 导出管理：模板 CRUD + 任务执行记录 + 下载
#[component]
pub fn ExportsSection() -> impl IntoView {
    let api = use_api();

    let (templates, set_templates) = signal(Vec::<ExportTemplate>::new());
    let (runs, set_runs) = signal(Vec::<ExportRun>::new());
    let (loading, set_loading) = signal(true);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let (show_new, set_show_new) = signal(false);
    let (running, set_running) = signal(false);

    // 模板与执行记录并行拉取；任一失败都降级为空列表
    let refresh_all = {
        let api = api.clone();
        move || {
            let api = api.clone();
            set_loading.set(true);
            set_error_msg.set(None);
            spawn_local(async move {
                let (templates, runs) =
                    futures::join!(api.list_export_templates(), api.list_export_runs());
                set_templates.try_set(templates.unwrap_or_default());
                set_runs.try_set(runs.unwrap_or_default());
                set_loading.try_set(false);
            });
        }
    };

    {
        let refresh_all = refresh_all.clone();
        Effect::new(move |_| refresh_all());
    }

    let run_template = {
        let api = api.clone();
        let refresh_all = refresh_all.clone();
        move |template_id: String| {
            let api = api.clone();
            let refresh_all = refresh_all.clone();
            set_running.set(true);
            spawn_local(async move {
                let request = RunExportRequest { template_id };
                match api.run_export_job(&request).await {
                    Ok(()) => refresh_all(),
                    Err(err) => {
                        set_error_msg.try_set(Some(err.to_string()));
                    }
                }
                set_running.try_set(false);
            });
        }
    };

    let delete_template = {
        let api = api.clone();
        let refresh_all = refresh_all.clone();
        move |id: String| {
            if !confirm("Delete this export template?") {
                return;
            }
            let api = api.clone();
            let refresh_all = refresh_all.clone();
            spawn_local(async move {
                match api.delete_export_template(&id).await {
                    Ok(()) => refresh_all(),
                    Err(err) => {
                        set_error_msg.try_set(Some(err.to_string()));
                    }
                }
            });
        }
    };

    let create_presets = {
        let api = api.clone();
        let refresh_all = refresh_all.clone();
        move |_| {
            let api = api.clone();
            let refresh_all = refresh_all.clone();
            spawn_local(async move {
                match api.create_export_presets().await {
                    Ok(()) => refresh_all(),
                    Err(err) => {
                        set_error_msg.try_set(Some(err.to_string()));
                    }
                }
            });
        }
    };

    let on_created = {
        let refresh_all = refresh_all.clone();
        move |_: ()| {
            set_show_new.set(false);
            refresh_all();
        }
    };

    let download_url = {
        let api = api.clone();
        move |run_id: &str| api.export_download_url(run_id)
    };

    view! {
        <div class="space-y-6">
            <div class="card bg-base-100 shadow-xl">
                <div class="card-body">
                    <div class="flex items-center justify-between">
                        <h2 class="card-title">"Export Templates"</h2>
                        <div class="flex gap-2">
                            <button class="btn btn-sm" on:click=create_presets.clone()>
                                "Create presets"
                            </button>
                            <button
                                class="btn btn-primary btn-sm gap-1"
                                on:click=move |_| set_show_new.update(|v| *v = !*v)
                            >
                                <Plus attr:class="h-4 w-4" /> "New template"
                            </button>
                        </div>
                    </div>

                    <Show when=move || error_msg.get().is_some()>
                        <div class="alert alert-error text-sm py-2">
                            <span>{move || error_msg.get().unwrap_or_default()}</span>
                        </div>
                    </Show>

                    <Show when=move || show_new.get()>
                        <TemplateForm on_saved=on_created.clone() />
                    </Show>

                    <div class="overflow-x-auto">
                        <table class="table w-full">
                            <thead>
                                <tr>
                                    <th>"Name"</th>
                                    <th>"Entity"</th>
                                    <th>"Format"</th>
                                    <th>"Fields"</th>
                                    <th></th>
                                </tr>
                            </thead>
                            <tbody>
                                <Show when=move || !loading.get() && templates.with(Vec::is_empty)>
                                    <tr>
                                        <td colspan="5" class="text-center py-6 text-base-content/50">
                                            "No templates. Create one or load the presets."
                                        </td>
                                    </tr>
                                </Show>
                                <For
                                    each=move || templates.get()
                                    key=|t| t.id.clone().unwrap_or_default()
                                    children={
                                        let run_template = run_template.clone();
                                        let delete_template = delete_template.clone();
                                        move |template| {
                                            let id = template.id.clone().unwrap_or_default();
                                            let run_id = id.clone();
                                            let del_id = id.clone();
                                            let run_template = run_template.clone();
                                            let delete_template = delete_template.clone();
                                            view! {
                                                <tr>
                                                    <td class="font-medium">{template.name.clone()}</td>
                                                    <td>{template.entity.clone()}</td>
                                                    <td>
                                                        <span class="badge badge-outline">{template.format.clone()}</span>
                                                    </td>
                                                    <td class="text-sm text-base-content/60">
                                                        {template.fields.join(", ")}
                                                    </td>
                                                    <td class="flex gap-1">
                                                        <button
                                                            class="btn btn-xs btn-primary"
                                                            disabled=move || running.get()
                                                            on:click=move |_| run_template(run_id.clone())
                                                        >
                                                            "Run"
                                                        </button>
                                                        <button
                                                            class="btn btn-xs btn-ghost text-error"
                                                            on:click=move |_| delete_template(del_id.clone())
                                                        >
                                                            <Trash2 attr:class="h-3 w-3" />
                                                        </button>
                                                    </td>
                                                </tr>
                                            }
                                        }
                                    }
                                />
                            </tbody>
                        </table>
                    </div>
                </div>
            </div>

            <div class="card bg-base-100 shadow-xl">
                <div class="card-body">
                    <h2 class="card-title">"Export Runs"</h2>
                    <div class="overflow-x-auto">
                        <table class="table w-full">
                            <thead>
                                <tr>
                                    <th>"Template"</th>
                                    <th>"Status"</th>
                                    <th>"Rows"</th>
                                    <th>"Created"</th>
                                    <th></th>
                                </tr>
                            </thead>
                            <tbody>
                                <Show when=move || !loading.get() && runs.with(Vec::is_empty)>
                                    <tr>
                                        <td colspan="5" class="text-center py-6 text-base-content/50">
                                            "No export runs yet."
                                        </td>
                                    </tr>
                                </Show>
                                <For
                                    each=move || runs.get()
                                    key=|run| run.id.clone()
                                    children={
                                        let download_url = download_url.clone();
                                        move |run| {
                                            let done = run.is_done();
                                            let href = download_url(&run.id);
                                            view! {
                                                <tr>
                                                    <td>{run.template_name.clone().unwrap_or_else(|| "—".into())}</td>
                                                    <td>
                                                        <span class=move || {
                                                            if done {
                                                                "badge badge-success badge-outline"
                                                            } else {
                                                                "badge badge-warning badge-outline"
                                                            }
                                                        }>
                                                            {run.status.clone().unwrap_or_else(|| "pending".into())}
                                                        </span>
                                                    </td>
                                                    <td>{run.rows.map(|r| r.to_string()).unwrap_or_else(|| "—".into())}</td>
                                                    <td class="text-sm opacity-70">
                                                        {run
                                                            .created_at
                                                            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
                                                            .unwrap_or_else(|| "—".into())}
                                                    </td>
                                                    <td>
                                                        <Show when=move || done>
                                                            <a class="btn btn-xs gap-1" href=href.clone() target="_blank">
                                                                <Download attr:class="h-3 w-3" /> "Download"
                                                            </a>
                                                        </Show>
                                                    </td>
                                                </tr>
                                            }
                                        }
                                    }
                                />
                            </tbody>
                        </table>
                    </div>
                </div>
            </div>
        </div>
    }
}

/// 新建导出模板表单；字段清单用逗号分隔输入
#[component]
fn TemplateForm(#[prop(into)] on_saved: Callback<()>) -> impl IntoView {
    let api = use_api();

    let (name, set_name) = signal(String::new());
    let (entity, set_entity) = signal(ENTITIES[0].to_string());
    let (format, set_format) = signal(FORMATS[0].to_string());
    let (fields_input, set_fields_input) = signal(String::new());
    let (saving, set_saving) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let on_submit = {
        let api = api.clone();
        move |ev: web_sys::SubmitEvent| {
            ev.prevent_default();
            if name.get().trim().is_empty() {
                set_error_msg.set(Some("Template name is required".into()));
                return;
            }

            let fields = fields_input
                .get_untracked()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            let template = ExportTemplate {
                id: None,
                name: name.get_untracked().trim().to_string(),
                entity: entity.get_untracked(),
                format: format.get_untracked(),
                fields,
                filters: serde_json::Value::Object(Default::default()),
            };

            let api = api.clone();
            set_saving.set(true);
            spawn_local(async move {
                match api.create_export_template(&template).await {
                    Ok(()) => on_saved.run(()),
                    Err(err) => {
                        set_error_msg.try_set(Some(err.to_string()));
                    }
                }
                set_saving.try_set(false);
            });
        }
    };

    view! {
        <form class="bg-base-200 rounded-lg p-4 space-y-3" on:submit=on_submit>
            <Show when=move || error_msg.get().is_some()>
                <div class="alert alert-error text-sm py-2">
                    <span>{move || error_msg.get().unwrap_or_default()}</span>
                </div>
            </Show>

            <div class="flex gap-3 flex-wrap">
                <input
                    type="text"
                    placeholder="Template name"
                    class="input input-bordered input-sm"
                    on:input=move |ev| set_name.set(event_target_value(&ev))
                    prop:value=name
                    required
                />
                <select
                    class="select select-bordered select-sm"
                    on:change=move |ev| set_entity.set(event_target_value(&ev))
                >
                    {ENTITIES
                        .iter()
                        .map(|e| view! { <option selected=move || entity.get() == *e>{*e}</option> })
                        .collect_view()}
                </select>
                <select
                    class="select select-bordered select-sm"
                    on:change=move |ev| set_format.set(event_target_value(&ev))
                >
                    {FORMATS
                        .iter()
                        .map(|f| view! { <option selected=move || format.get() == *f>{*f}</option> })
                        .collect_view()}
                </select>
                <input
                    type="text"
                    placeholder="Fields (comma separated)"
                    class="input input-bordered input-sm flex-1 min-w-48"
                    on:input=move |ev| set_fields_input.set(event_target_value(&ev))
                    prop:value=fields_input
                />
            </div>

            <button type="submit" class="btn btn-primary btn-sm" disabled=move || saving.get()>
                {move || if saving.get() { "Saving..." } else { "Save template" }}
            </button>
        </form>
    }
}
