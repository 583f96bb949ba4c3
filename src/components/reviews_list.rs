use leptos::*;

use crate::models::review::ReviewWithAuthor;

#[component]
pub fn ReviewsList(reviews: Vec<ReviewWithAuthor>) -> impl IntoView {
    view! {
        <div class="reviews">
            <h3>"Reviews"</h3>
            {if reviews.is_empty() {
                view! { <p>"No reviews yet."</p> }.into_view()
            } else {
                view! {
                    <ul>
                        {reviews.into_iter().map(|review| view! {
                            <li>
                                <strong>{format!("{}/5", review.rating)}</strong>
                                " by " {review.username}
                                <p>{review.feedback}</p>
                            </li>
                        }).collect::<Vec<_>>()}
                    </ul>
                }.into_view()
            }}
        </div>
    }
}
