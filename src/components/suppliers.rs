use leptos::prelude::*;
use leptos::task::spawn_local;

use invomail_shared::directory::{DuplicateGroup, MergeSuppliersRequest, Supplier};

use crate::auth::use_api;
use crate::components::icons::{Plus, Users};
use crate::components::selection::SelectionModel;

fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

/// 供应商目录：主数据表 + 编辑表单 + 合并/冻结等批量操作 + 疑似重复视图
#[component]
pub fn SuppliersSection() -> impl IntoView {
    let api = use_api();

    let (suppliers, set_suppliers) = signal(Vec::<Supplier>::new());
    let (duplicates, set_duplicates) = signal(Vec::<DuplicateGroup>::new());
    let (show_duplicates, set_show_duplicates) = signal(false);
    let (loading, set_loading) = signal(true);
    let (msg, set_msg) = signal(Option::<String>::None);
    let (editing, set_editing) = signal(Option::<Supplier>::None);
    let (busy, set_busy) = signal(false);
    let selection = RwSignal::new(SelectionModel::new());

    let load = {
        let api = api.clone();
        move || {
            let api = api.clone();
            set_loading.set(true);
            spawn_local(async move {
                match api.list_suppliers().await {
                    Ok(data) => {
                        set_suppliers.try_set(data);
                    }
                    Err(err) => {
                        set_msg.try_set(Some(format!("Failed to load suppliers: {err}")));
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

    // 批量动作的统一执行器：成功后清空选择并重新拉取
    let run_batch = {
        let api = api.clone();
        let load = load.clone();
        move |kind: &'static str| {
            let ids = selection.get_untracked().ids();
            if ids.is_empty() {
                set_msg.set(Some("Select one or more suppliers first".into()));
                return;
            }
            if kind == "delete" && !confirm("Delete the selected suppliers?") {
                return;
            }
            if kind == "block" && !confirm("Block the selected suppliers?") {
                return;
            }
            let api = api.clone();
            let load = load.clone();
            set_busy.set(true);
            spawn_local(async move {
                let result = match kind {
                    "delete" => api.delete_suppliers(&ids).await,
                    "block" => api.block_suppliers(&ids).await,
                    "activate" => api.activate_suppliers(&ids).await,
                    "deactivate" => api.deactivate_suppliers(&ids).await,
                    _ => Ok(()),
                };
                match result {
                    Ok(()) => {
                        selection.update(SelectionModel::clear);
                        set_msg.try_set(Some(format!("{kind} applied to {} supplier(s)", ids.len())));
                        load();
                    }
                    Err(err) => {
                        set_msg.try_set(Some(err.to_string()));
                    }
                }
                set_busy.try_set(false);
            });
        }
    };

    // 合并：选中 ≥2，第一个选中的作为主记录
    let merge_selected = {
        let api = api.clone();
        let load = load.clone();
        move |_| {
            let ids = selection.get_untracked().ids();
            if ids.len() < 2 {
                set_msg.set(Some("Select at least two suppliers to merge".into()));
                return;
            }
            if !confirm("Merge the selected suppliers into one record?") {
                return;
            }
            let request = MergeSuppliersRequest {
                primary_id: ids[0].clone(),
                ids,
            };
            let api = api.clone();
            let load = load.clone();
            set_busy.set(true);
            spawn_local(async move {
                match api.merge_suppliers(&request).await {
                    Ok(()) => {
                        selection.update(SelectionModel::clear);
                        set_msg.try_set(Some("Suppliers merged".into()));
                        load();
                    }
                    Err(err) => {
                        set_msg.try_set(Some(err.to_string()));
                    }
                }
                set_busy.try_set(false);
            });
        }
    };

    let open_edit = move |_| {
        let Some(id) = selection.get_untracked().single().map(str::to_string) else {
            set_msg.set(Some("Select exactly one supplier to edit".into()));
            return;
        };
        let current = suppliers
            .get_untracked()
            .into_iter()
            .find(|s| s.id.as_deref() == Some(id.as_str()));
        set_editing.set(current);
    };

    let toggle_duplicates = {
        let api = api.clone();
        move |_| {
            if show_duplicates.get_untracked() {
                set_show_duplicates.set(false);
                return;
            }
            let api = api.clone();
            spawn_local(async move {
                match api.get_supplier_duplicates().await {
                    Ok(groups) => {
                        set_duplicates.try_set(groups);
                        set_show_duplicates.try_set(true);
                    }
                    Err(err) => {
                        set_msg.try_set(Some(err.to_string()));
                    }
                }
            });
        }
    };

    let on_saved = {
        let load = load.clone();
        move |_: ()| {
            set_editing.set(None);
            selection.update(SelectionModel::clear);
            load();
        }
    };

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body">
                <div class="flex items-center justify-between flex-wrap gap-2">
                    <h2 class="card-title">
                        <Users attr:class="h-5 w-5" /> "Suppliers"
                    </h2>
                    <div class="flex gap-2 flex-wrap">
                        <button class="btn btn-sm" on:click=toggle_duplicates.clone()>
                            {move || if show_duplicates.get() { "Hide duplicates" } else { "Find duplicates" }}
                        </button>
                        <button class="btn btn-sm" disabled=move || busy.get() on:click=open_edit>
                            "Edit"
                        </button>
                        <button
                            class="btn btn-sm"
                            disabled=move || busy.get()
                            on:click=merge_selected.clone()
                        >
                            "Merge"
                        </button>
                        <button
                            class="btn btn-sm"
                            disabled=move || busy.get()
                            on:click={
                                let run_batch = run_batch.clone();
                                move |_| run_batch("activate")
                            }
                        >
                            "Activate"
                        </button>
                        <button
                            class="btn btn-sm"
                            disabled=move || busy.get()
                            on:click={
                                let run_batch = run_batch.clone();
                                move |_| run_batch("deactivate")
                            }
                        >
                            "Deactivate"
                        </button>
                        <button
                            class="btn btn-sm btn-warning"
                            disabled=move || busy.get()
                            on:click={
                                let run_batch = run_batch.clone();
                                move |_| run_batch("block")
                            }
                        >
                            "Block"
                        </button>
                        <button
                            class="btn btn-sm btn-error"
                            disabled=move || busy.get()
                            on:click={
                                let run_batch = run_batch.clone();
                                move |_| run_batch("delete")
                            }
                        >
                            "Delete"
                        </button>
                        <button
                            class="btn btn-sm btn-primary gap-1"
                            on:click=move |_| set_editing.set(Some(Supplier::default()))
                        >
                            <Plus attr:class="h-4 w-4" /> "New"
                        </button>
                    </div>
                </div>

                <Show when=move || msg.get().is_some()>
                    <div class="alert alert-info text-sm py-2">
                        <span>{move || msg.get().unwrap_or_default()}</span>
                    </div>
                </Show>

                <Show when=move || editing.get().is_some()>
                    <SupplierEditor
                        initial=Signal::derive(move || editing.get().unwrap_or_default())
                        on_saved=on_saved.clone()
                        on_cancel=move |_| set_editing.set(None)
                    />
                </Show>

                <Show when=move || show_duplicates.get()>
                    <div class="bg-base-200 rounded-lg p-4">
                        <h3 class="font-semibold mb-2">"Possible duplicates"</h3>
                        <Show when=move || duplicates.with(Vec::is_empty)>
                            <p class="text-sm text-base-content/60">"No duplicate candidates found."</p>
                        </Show>
                        <For
                            each={move || duplicates.get().into_iter().enumerate().collect::<Vec<_>>()}
                            key=|(idx, _)| *idx
                            children=move |(_, group)| {
                                let names = group
                                    .suppliers
                                    .iter()
                                    .map(|s| s.name.clone())
                                    .collect::<Vec<_>>()
                                    .join(", ");
                                view! {
                                    <div class="text-sm py-1">
                                        <span class="font-medium">{names}</span>
                                        <span class="text-base-content/60">
                                            {group
                                                .reason
                                                .clone()
                                                .map(|r| format!(" — {r}"))
                                                .unwrap_or_default()}
                                        </span>
                                    </div>
                                }
                            }
                        />
                    </div>
                </Show>

                <div class="overflow-x-auto">
                    <table class="table table-zebra w-full">
                        <thead>
                            <tr>
                                <th class="w-10"></th>
                                <th>"Name"</th>
                                <th>"Tax ID"</th>
                                <th>"Country"</th>
                                <th>"Category"</th>
                                <th>"Status"</th>
                            </tr>
                        </thead>
                        <tbody>
                            <Show when=move || loading.get()>
                                <tr>
                                    <td colspan="6" class="text-center py-6 text-base-content/50">
                                        <span class="loading loading-spinner loading-md"></span>
                                    </td>
                                </tr>
                            </Show>
                            <Show when=move || !loading.get() && suppliers.with(Vec::is_empty)>
                                <tr>
                                    <td colspan="6" class="text-center py-6 text-base-content/50">
                                        "No suppliers yet."
                                    </td>
                                </tr>
                            </Show>
                            <For
                                each=move || suppliers.get()
                                key=|supplier| supplier.id.clone().unwrap_or_default()
                                children=move |supplier| {
                                    let id = supplier.id.clone().unwrap_or_default();
                                    let checked = {
                                        let id = id.clone();
                                        move || selection.get().contains(&id)
                                    };
                                    let on_toggle = {
                                        let id = id.clone();
                                        move |_| selection.update(|s| s.toggle(&id))
                                    };
                                    let active = supplier.is_active();
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
                                            <td class="font-medium">{supplier.name.clone()}</td>
                                            <td class="font-mono text-sm">
                                                {supplier.tax_id.clone().unwrap_or_else(|| "—".into())}
                                            </td>
                                            <td>{supplier.country.clone().unwrap_or_else(|| "—".into())}</td>
                                            <td>{supplier.category.clone().unwrap_or_else(|| "—".into())}</td>
                                            <td>
                                                {if active {
                                                    view! {
                                                        <span class="badge badge-success badge-outline">"Active"</span>
                                                    }
                                                        .into_any()
                                                } else {
                                                    view! {
                                                        <span class="badge badge-ghost">
                                                            {supplier.status.clone().unwrap_or_else(|| "Inactive".into())}
                                                        </span>
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

/// 供应商编辑/新建表单；`initial.id` 为空即新建
#[component]
fn SupplierEditor(
    initial: Signal<Supplier>,
    #[prop(into)] on_saved: Callback<()>,
    #[prop(into)] on_cancel: Callback<()>,
) -> impl IntoView {
    let api = use_api();

    let snapshot = initial.get_untracked();
    let (name, set_name) = signal(snapshot.name.clone());
    let (tax_id, set_tax_id) = signal(snapshot.tax_id.clone().unwrap_or_default());
    let (country, set_country) = signal(snapshot.country.clone().unwrap_or_default());
    let (category, set_category) = signal(snapshot.category.clone().unwrap_or_default());
    let (saving, set_saving) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let on_submit = {
        let api = api.clone();
        move |ev: web_sys::SubmitEvent| {
            ev.prevent_default();
            if name.get().trim().is_empty() {
                set_error_msg.set(Some("Name is required".into()));
                return;
            }

            let id = initial.get_untracked().id;
            let field = |s: String| {
                let trimmed = s.trim().to_string();
                (!trimmed.is_empty()).then_some(trimmed)
            };
            let payload = Supplier {
                id: id.clone(),
                name: name.get_untracked().trim().to_string(),
                tax_id: field(tax_id.get_untracked()),
                country: field(country.get_untracked()),
                category: field(category.get_untracked()),
                status: initial.get_untracked().status,
            };

            let api = api.clone();
            set_saving.set(true);
            set_error_msg.set(None);
            spawn_local(async move {
                let result = match &id {
                    Some(id) => api.update_supplier(id, &payload).await,
                    None => api.create_supplier(&payload).await,
                };
                match result {
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

            <div class="grid grid-cols-2 md:grid-cols-4 gap-3">
                <input
                    type="text"
                    placeholder="Name"
                    class="input input-bordered input-sm"
                    on:input=move |ev| set_name.set(event_target_value(&ev))
                    prop:value=name
                    required
                />
                <input
                    type="text"
                    placeholder="Tax ID"
                    class="input input-bordered input-sm"
                    on:input=move |ev| set_tax_id.set(event_target_value(&ev))
                    prop:value=tax_id
                />
                <input
                    type="text"
                    placeholder="Country"
                    class="input input-bordered input-sm"
                    on:input=move |ev| set_country.set(event_target_value(&ev))
                    prop:value=country
                />
                <input
                    type="text"
                    placeholder="Category"
                    class="input input-bordered input-sm"
                    on:input=move |ev| set_category.set(event_target_value(&ev))
                    prop:value=category
                />
            </div>

            <div class="flex gap-2">
                <button type="submit" class="btn btn-primary btn-sm" disabled=move || saving.get()>
                    {move || if saving.get() { "Saving..." } else { "Save" }}
                </button>
                <button type="button" class="btn btn-ghost btn-sm" on:click=move |_| on_cancel.run(())>
                    "Cancel"
                </button>
            </div>
        </form>
    }
}
