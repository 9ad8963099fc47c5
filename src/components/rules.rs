use leptos::prelude::*;
use leptos::task::spawn_local;

use invomail_shared::directory::{Rule, RuleAction, RuleCondition};

use crate::auth::use_api;
use crate::components::icons::{Plus, Trash2};
use crate::components::selection::SelectionModel;

const CONDITION_FIELDS: [&str; 4] = ["sender", "subject", "attachment_name", "body"];
const CONDITION_OPERATORS: [&str; 4] = ["contains", "equals", "starts_with", "ends_with"];
const ACTION_TYPES: [&str; 4] = ["assign_supplier", "set_status", "set_category", "skip"];

fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

/// 规则与自动化：列表 + 单条规则编辑器 + 批量删除
#[component]
pub fn RulesSection() -> impl IntoView {
    let api = use_api();

    let (rules, set_rules) = signal(Vec::<Rule>::new());
    let (loading, set_loading) = signal(true);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let (show_builder, set_show_builder) = signal(false);
    let selection = RwSignal::new(SelectionModel::new());

    let load = {
        let api = api.clone();
        move || {
            let api = api.clone();
            set_loading.set(true);
            spawn_local(async move {
                match api.list_rules().await {
                    Ok(data) => {
                        set_rules.try_set(data);
                    }
                    Err(err) => {
                        log::warn!("rules: load failed: {err}");
                        set_rules.try_set(Vec::new());
                    }
                }
                set_loading.try_set(false);
            });
        }
    };

    {
        let load = load.clone();
        Effect::new(move |_| load());
    }

    let delete_selected = {
        let api = api.clone();
        let load = load.clone();
        move |_| {
            let ids = selection.get_untracked().ids();
            if ids.is_empty() || !confirm("Delete the selected rules?") {
                return;
            }
            let api = api.clone();
            let load = load.clone();
            spawn_local(async move {
                match api.delete_rules(&ids).await {
                    Ok(()) => {
                        selection.update(SelectionModel::clear);
                        load();
                    }
                    Err(err) => {
                        set_error_msg.try_set(Some(err.to_string()));
                    }
                }
            });
        }
    };

    let on_created = {
        let load = load.clone();
        move |_: ()| {
            set_show_builder.set(false);
            load();
        }
    };

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body">
                <div class="flex items-center justify-between">
                    <h2 class="card-title">"Rules & Automation"</h2>
                    <div class="flex gap-2">
                        <Show when=move || !selection.get().is_empty()>
                            <button class="btn btn-error btn-sm gap-2" on:click=delete_selected.clone()>
                                <Trash2 attr:class="h-4 w-4" />
                                {move || format!("Delete ({})", selection.get().len())}
                            </button>
                        </Show>
                        <button
                            class="btn btn-primary btn-sm gap-2"
                            on:click=move |_| set_show_builder.update(|v| *v = !*v)
                        >
                            <Plus attr:class="h-4 w-4" /> "Add New Rule"
                        </button>
                    </div>
                </div>

                <Show when=move || error_msg.get().is_some()>
                    <div class="alert alert-error text-sm py-2">
                        <span>{move || error_msg.get().unwrap_or_default()}</span>
                    </div>
                </Show>

                <Show when=move || show_builder.get()>
                    <RuleBuilder on_saved=on_created.clone() />
                </Show>

                <div class="overflow-x-auto">
                    <table class="table w-full">
                        <thead>
                            <tr>
                                <th class="w-10"></th>
                                <th>"Name"</th>
                                <th>"Trigger"</th>
                                <th>"Action"</th>
                                <th>"Status"</th>
                            </tr>
                        </thead>
                        <tbody>
                            <Show when=move || loading.get()>
                                <tr>
                                    <td colspan="5" class="text-center py-6 text-base-content/50">
                                        <span class="loading loading-spinner loading-md"></span>
                                    </td>
                                </tr>
                            </Show>
                            <Show when=move || !loading.get() && rules.with(Vec::is_empty)>
                                <tr>
                                    <td colspan="5" class="text-center py-6 text-base-content/50">
                                        "No rules defined"
                                    </td>
                                </tr>
                            </Show>
                            <For
                                each=move || rules.get()
                                key=|rule| rule.id.clone().unwrap_or_default()
                                children=move |rule| {
                                    let id = rule.id.clone().unwrap_or_default();
                                    let checked = {
                                        let id = id.clone();
                                        move || selection.get().contains(&id)
                                    };
                                    let on_toggle = {
                                        let id = id.clone();
                                        move |_| selection.update(|s| s.toggle(&id))
                                    };
                                    view! {
                                        <tr class="hover:bg-base-200">
                                            <td>
                                                <input
                                                    type="checkbox"
                                                    class="checkbox checkbox-sm"
                                                    prop:checked=checked
                                                    on:change=on_toggle
                                                />
                                            </td>
                                            <td class="font-medium">{rule.name.clone()}</td>
                                            <td class="text-sm">
                                                {rule.trigger_summary().unwrap_or_else(|| "—".into())}
                                            </td>
                                            <td class="text-sm">
                                                {rule.action_summary().unwrap_or_else(|| "—".into())}
                                            </td>
                                            <td>
                                                {if rule.active {
                                                    view! {
                                                        <span class="badge badge-success badge-outline">"Active"</span>
                                                    }
                                                        .into_any()
                                                } else {
                                                    view! {
                                                        <span class="badge badge-ghost">"Inactive"</span>
                                                    }
                                                        .into_any()
                                                }}
                                            </td>
                                        </tr>
                                    }
                                }
                            />
                        </tbody>
                    </table>
                </div>
            </div>
        </div>
    }
}

/// 单条规则编辑器：一个条件 + 一个动作（后端支持多条，UI 先做最小集）
#[component]
fn RuleBuilder(#[prop(into)] on_saved: Callback<()>) -> impl IntoView {
    let api = use_api();

    let (name, set_name) = signal(String::new());
    let (field, set_field) = signal(CONDITION_FIELDS[0].to_string());
    let (operator, set_operator) = signal(CONDITION_OPERATORS[0].to_string());
    let (value, set_value) = signal(String::new());
    let (action_type, set_action_type) = signal(ACTION_TYPES[0].to_string());
    let (action_detail, set_action_detail) = signal(String::new());
    let (active, set_active) = signal(true);
    let (saving, set_saving) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let on_submit = {
        let api = api.clone();
        move |ev: web_sys::SubmitEvent| {
            ev.prevent_default();
            if name.get().trim().is_empty() || value.get().trim().is_empty() {
                set_error_msg.set(Some("Name and condition value are required".into()));
                return;
            }

            let detail = action_detail.get_untracked().trim().to_string();
            let rule = Rule {
                id: None,
                name: name.get_untracked().trim().to_string(),
                conditions: vec![RuleCondition {
                    field: field.get_untracked(),
                    operator: operator.get_untracked(),
                    value: value.get_untracked().trim().to_string(),
                }],
                actions: vec![RuleAction {
                    kind: action_type.get_untracked(),
                    detail: (!detail.is_empty()).then_some(detail),
                }],
                active: active.get_untracked(),
            };

            let api = api.clone();
            set_saving.set(true);
            set_error_msg.set(None);
            spawn_local(async move {
                match api.create_rule(&rule).await {
                    Ok(()) => on_saved.run(()),
                    Err(err) => {
                        set_error_msg.try_set(Some(err.to_string()));
                    }
                }
                set_saving.try_set(false);
            });
        }
    };

    let options = |items: &'static [&'static str], current: ReadSignal<String>| {
        items
            .iter()
            .map(|item| {
                view! { <option selected=move || current.get() == *item>{*item}</option> }
            })
            .collect_view()
    };

    view! {
        <form class="bg-base-200 rounded-lg p-4 space-y-3" on:submit=on_submit>
            <Show when=move || error_msg.get().is_some()>
                <div class="alert alert-error text-sm py-2">
                    <span>{move || error_msg.get().unwrap_or_default()}</span>
                </div>
            </Show>

            <input
                type="text"
                placeholder="Rule name"
                class="input input-bordered input-sm w-full max-w-sm"
                on:input=move |ev| set_name.set(event_target_value(&ev))
                prop:value=name
                required
            />

            <div class="flex items-center gap-2 flex-wrap">
                <span class="text-sm font-medium">"When"</span>
                <select
                    class="select select-bordered select-sm"
                    on:change=move |ev| set_field.set(event_target_value(&ev))
                >
                    {options(&CONDITION_FIELDS, field)}
                </select>
                <select
                    class="select select-bordered select-sm"
                    on:change=move |ev| set_operator.set(event_target_value(&ev))
                >
                    {options(&CONDITION_OPERATORS, operator)}
                </select>
                <input
                    type="text"
                    placeholder="value"
                    class="input input-bordered input-sm"
                    on:input=move |ev| set_value.set(event_target_value(&ev))
                    prop:value=value
                    required
                />
            </div>

            <div class="flex items-center gap-2 flex-wrap">
                <span class="text-sm font-medium">"Then"</span>
                <select
                    class="select select-bordered select-sm"
                    on:change=move |ev| set_action_type.set(event_target_value(&ev))
                >
                    {options(&ACTION_TYPES, action_type)}
                </select>
                <input
                    type="text"
                    placeholder="detail (optional)"
                    class="input input-bordered input-sm"
                    on:input=move |ev| set_action_detail.set(event_target_value(&ev))
                    prop:value=action_detail
                />
                <label class="label cursor-pointer gap-2">
                    <input
                        type="checkbox"
                        class="toggle toggle-sm toggle-primary"
                        prop:checked=active
                        on:change=move |ev| set_active.set(event_target_checked(&ev))
                    />
                    <span class="label-text">"Active"</span>
                </label>
            </div>

            <button type="submit" class="btn btn-primary btn-sm" disabled=move || saving.get()>
                {move || if saving.get() { "Saving..." } else { "Save rule" }}
            </button>
        </form>
    }
}
