use leptos::prelude::*;
use leptos::task::spawn_local;

use super::WizardState;
use crate::auth::use_api;

/// 第 3 步：选择要扫描的文件夹。
/// 列表按上一步产出的账号邮箱从后端拉取；端点不可用时退回常见默认值。
#[component]
pub fn StepSelectFolders(state: WizardState) -> impl IntoView {
    let api = use_api();

    let (available, set_available) = signal(Vec::<String>::new());
    let (loading, set_loading) = signal(true);
    let (custom_name, set_custom_name) = signal(String::new());

    // 进入本步时拉取文件夹
    {
        let api = api.clone();
        Effect::new(move |_| {
            let Some(creds) = state.creds.get_untracked() else {
                set_loading.set(false);
                return;
            };
            let api = api.clone();
            set_loading.set(true);
            spawn_local(async move {
                let list = api.list_imap_folders(&creds.email).await;
                set_available.try_set(list.folders);
                set_loading.try_set(false);
            });
        });
    }

    let toggle_folder = move |folder: String| {
        state.folders.update(|selected| {
            if let Some(pos) = selected.iter().position(|f| *f == folder) {
                selected.remove(pos);
            } else {
                selected.push(folder);
            }
        });
    };

    let add_custom = move |_| {
        let name = custom_name.get().trim().to_string();
        if name.is_empty() {
            return;
        }
        set_available.update(|folders| {
            if !folders.contains(&name) {
                folders.push(name.clone());
            }
        });
        state.folders.update(|selected| {
            if !selected.contains(&name) {
                selected.push(name);
            }
        });
        set_custom_name.set(String::new());
    };

    view! {
        <div>
            <h3 class="text-xl font-semibold mb-4">"Select folders to scan"</h3>

            <Show
                when=move || !loading.get()
                fallback=|| view! { <p class="text-base-content/60">"Loading folders..."</p> }
            >
                <div class="grid grid-cols-2 md:grid-cols-3 gap-3">
                    <For
                        each=move || available.get()
                        key=|folder| folder.clone()
                        children=move |folder| {
                            let name = folder.clone();
                            let checked = {
                                let name = name.clone();
                                move || state.folders.get().contains(&name)
                            };
                            view! {
                                <label class=move || {
                                    if checked() {
                                        "flex items-center gap-2 border-2 border-primary rounded-lg p-3 cursor-pointer bg-base-200"
                                    } else {
                                        "flex items-center gap-2 border border-base-300 rounded-lg p-3 cursor-pointer hover:bg-base-200"
                                    }
                                }>
                                    <input
                                        type="checkbox"
                                        class="checkbox checkbox-sm"
                                        prop:checked=checked.clone()
                                        on:change={
                                            let name = folder.clone();
                                            move |_| toggle_folder(name.clone())
                                        }
                                    />
                                    <span class="font-medium">{folder.clone()}</span>
                                </label>
                            }
                        }
                    />
                </div>

                <div class="join mt-4">
                    <input
                        type="text"
                        placeholder="Custom folder name"
                        class="input input-bordered input-sm join-item"
                        on:input=move |ev| set_custom_name.set(event_target_value(&ev))
                        prop:value=custom_name
                    />
                    <button type="button" class="btn btn-sm join-item" on:click=add_custom>
                        "Add Custom Folder"
                    </button>
                </div>

                <p class="text-sm text-base-content/60 mt-3">
                    {move || format!("{} folder(s) selected", state.folders.get().len())}
                </p>
            </Show>
        </div>
    }
}
